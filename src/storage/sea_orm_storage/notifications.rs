//! 通知存储操作

use super::SeaOrmStorage;
use crate::entity::notifications::{ActiveModel, Column, Entity as Notifications};
use crate::errors::{ReportError, Result};
use crate::models::notifications::{
    entities::Notification,
    requests::{CreateNotificationRequest, NotificationListQuery},
    responses::NotificationListResponse,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};

fn owned_by(user_id: i64) -> Select<Notifications> {
    Notifications::find().filter(Column::UserId.eq(user_id))
}

fn unread_of(user_id: i64) -> Select<Notifications> {
    owned_by(user_id).filter(Column::IsRead.eq(false))
}

impl SeaOrmStorage {
    pub async fn create_notification_impl(
        &self,
        req: CreateNotificationRequest,
    ) -> Result<Notification> {
        ActiveModel::unread(req, chrono::Utc::now().timestamp())
            .insert(&self.db)
            .await
            .map(|m| m.into_notification())
            .map_err(|e| ReportError::database_operation(format!("创建通知失败: {e}")))
    }

    /// 最新的在前；`unread_only` 只看未读
    pub async fn list_notifications_with_pagination_impl(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<NotificationListResponse> {
        let window = query.pagination.window();
        let select = if query.unread_only.unwrap_or(false) {
            unread_of(user_id)
        } else {
            owned_by(user_id)
        };

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, window.size);
        let counts = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| ReportError::database_operation(format!("统计通知数量失败: {e}")))?;
        let rows = paginator
            .fetch_page(window.zero_based())
            .await
            .map_err(|e| ReportError::database_operation(format!("查询通知列表失败: {e}")))?;

        Ok(NotificationListResponse {
            items: rows.into_iter().map(|m| m.into_notification()).collect(),
            pagination: window.describe(counts.number_of_items, counts.number_of_pages),
        })
    }

    pub async fn get_unread_notification_count_impl(&self, user_id: i64) -> Result<i64> {
        unread_of(user_id)
            .count(&self.db)
            .await
            .map(|n| n as i64)
            .map_err(|e| ReportError::database_operation(format!("查询未读通知数量失败: {e}")))
    }

    /// 只处理属于该用户的通知；返回 false 表示通知不存在或不属于该用户
    pub async fn mark_notification_as_read_impl(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<bool> {
        let Some(found) = owned_by(user_id)
            .filter(Column::Id.eq(notification_id))
            .one(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询通知失败: {e}")))?
        else {
            return Ok(false);
        };
        if found.is_read {
            return Ok(true);
        }

        Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::Id.eq(found.id))
            .exec(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("标记通知已读失败: {e}")))?;
        Ok(true)
    }

    /// 返回本次由未读变为已读的条数
    pub async fn mark_all_notifications_as_read_impl(&self, user_id: i64) -> Result<i64> {
        Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map(|r| r.rows_affected as i64)
            .map_err(|e| ReportError::database_operation(format!("标记全部通知已读失败: {e}")))
    }
}
