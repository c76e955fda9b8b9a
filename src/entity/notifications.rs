//! 通知实体

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use crate::models::notifications::{
    entities::{Notification, NotificationType},
    requests::CreateNotificationRequest,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub notification_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// 新通知一律未读
    pub fn unread(req: CreateNotificationRequest, created_at: i64) -> Self {
        Self {
            user_id: Set(req.user_id),
            notification_type: Set(req.notification_type.to_string()),
            title: Set(req.title),
            content: Set(req.content),
            reference_type: Set(req.reference_type),
            reference_id: Set(req.reference_id),
            is_read: Set(false),
            created_at: Set(created_at),
            ..Default::default()
        }
    }
}

impl Model {
    pub fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            // 无法识别的类型按任务通知处理
            notification_type: self
                .notification_type
                .parse()
                .unwrap_or(NotificationType::ReportAssigned),
            title: self.title,
            content: self.content,
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            is_read: self.is_read,
            created_at: super::unix_to_utc(self.created_at),
        }
    }
}
