//! 站内通知：每个用户只能看到、标记自己的通知

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    notifications::{
        requests::NotificationListQuery,
        responses::{MarkAllReadResponse, UnreadCountResponse},
    },
};

use super::{app_storage, current_user};

pub struct NotificationService;

impl NotificationService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn list_notifications(
        &self,
        query: NotificationListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        let page = app_storage(request)?
            .list_notifications_with_pagination(user.id, query)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            page,
            "Notifications retrieved successfully",
        )))
    }

    pub async fn unread_count(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        let unread_count = app_storage(request)?
            .get_unread_notification_count(user.id)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            UnreadCountResponse { unread_count },
            "Unread count retrieved successfully",
        )))
    }

    /// 他人的通知按不存在处理
    pub async fn mark_as_read(
        &self,
        notification_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        let marked = app_storage(request)?
            .mark_notification_as_read(user.id, notification_id)
            .await?;

        if marked {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Notification marked as read")))
        } else {
            Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::NotificationNotFound,
                format!("Notification {notification_id} not found"),
            )))
        }
    }

    pub async fn mark_all_as_read(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        let marked_count = app_storage(request)?
            .mark_all_notifications_as_read(user.id)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            MarkAllReadResponse { marked_count },
            "All notifications marked as read",
        )))
    }
}
