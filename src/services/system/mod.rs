use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::warn;

use crate::config::AppConfig;
use crate::models::{ApiResponse, AppStartTime, system::HealthResponse};

use super::app_storage;

pub struct SystemService;

impl SystemService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    /// 健康检查：数据库通过一次计数查询探活
    pub async fn health(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let config = self.get_config();

        let database_ok = match app_storage(request)?.count_users().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Health check database probe failed: {}", e);
                false
            }
        };

        let uptime_seconds = request
            .app_data::<web::Data<AppStartTime>>()
            .map(|start| {
                chrono::Utc::now()
                    .signed_duration_since(start.start_datetime)
                    .num_seconds()
            })
            .unwrap_or(0);

        let response = HealthResponse {
            system_name: config.app.system_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: config.app.environment.clone(),
            uptime_seconds,
            database_ok,
        };

        let body = ApiResponse::success(response, "OK");
        if database_ok {
            Ok(HttpResponse::Ok().json(body))
        } else {
            Ok(HttpResponse::ServiceUnavailable().json(body))
        }
    }
}
