//! 用户表：教师、协调员、校长与管理员共用

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use crate::models::users::{
    entities::{User, UserProfile, UserRole, UserStatus},
    requests::CreateUserRequest,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub profile_name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report_assignments::Entity")]
    ReportAssignments,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
}

impl Related<super::report_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportAssignments.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// 新账号一律为启用状态
    pub fn active_account(req: CreateUserRequest, now: i64) -> Self {
        Self {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            profile_name: Set(Some(req.profile.profile_name)),
            avatar_url: Set(req.profile.avatar_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

impl Model {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            // 无法识别的角色按教师处理
            role: self.role.parse().unwrap_or(UserRole::Teacher),
            status: self.status.parse().unwrap_or(UserStatus::Active),
            profile: UserProfile {
                profile_name: self.profile_name.unwrap_or_default(),
                avatar_url: self.avatar_url,
            },
            last_login: self.last_login.map(super::unix_to_utc),
            created_at: super::unix_to_utc(self.created_at),
            updated_at: super::unix_to_utc(self.updated_at),
        }
    }
}
