use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RateLimit, RequireJWT};
use crate::models::auth::requests::LoginRequest;
use crate::services::AuthService;

static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(req: HttpRequest, body: web::Json<LoginRequest>) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(body.into_inner(), &req).await
}

pub async fn me(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.me(&req).await
}

/// 登录按 IP 限流，`/me` 需要 JWT
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/login")
                    .wrap(RateLimit::login())
                    .route(web::post().to(login)),
            )
            .service(web::resource("/me").wrap(RequireJWT).route(web::get().to(me))),
    );
}
