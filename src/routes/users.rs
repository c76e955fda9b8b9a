use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, UserListQuery};
use crate::services::UserService;

static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListQuery>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(body.into_inner(), &req).await
}

pub async fn get_user(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(id.into_inner(), &req).await
}

/// 账号管理只对管理员开放；后 wrap 的先执行，因此先验 JWT 再验角色
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_users))
                    .route(web::post().to(create_user)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_user))),
    );
}
