use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::notifications::requests::NotificationListQuery;
use crate::services::NotificationService;

static NOTIFICATION_SERVICE: Lazy<NotificationService> =
    Lazy::new(NotificationService::new_lazy);

pub async fn list_notifications(
    req: HttpRequest,
    query: web::Query<NotificationListQuery>,
) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE
        .list_notifications(query.into_inner(), &req)
        .await
}

pub async fn unread_count(req: HttpRequest) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.unread_count(&req).await
}

pub async fn mark_as_read(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.mark_as_read(id.into_inner(), &req).await
}

pub async fn mark_all_as_read(req: HttpRequest) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.mark_all_as_read(&req).await
}

// read-all 必须注册在 /{id}/read 之前
pub fn configure_notification_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_notifications))
            .route("/unread-count", web::get().to(unread_count))
            .route("/read-all", web::put().to(mark_all_as_read))
            .route("/{id}/read", web::put().to(mark_as_read)),
    );
}
