use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::SystemService;

static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

pub async fn health(req: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.health(&req).await
}

/// 供负载均衡探活，不经过认证
pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/v1/system/health").route(web::get().to(health)));
}
