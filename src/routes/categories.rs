use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::categories::requests::{CreateCategoryRequest, CreateSubCategoryRequest};
use crate::services::CategoryService;

static CATEGORY_SERVICE: Lazy<CategoryService> = Lazy::new(CategoryService::new_lazy);

pub async fn list_categories(req: HttpRequest) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.list_categories(&req).await
}

pub async fn create_category(
    req: HttpRequest,
    body: web::Json<CreateCategoryRequest>,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.create_category(body.into_inner(), &req).await
}

pub async fn delete_category(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE.delete_category(id.into_inner(), &req).await
}

pub async fn list_sub_categories(
    req: HttpRequest,
    id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE
        .list_sub_categories(id.into_inner(), &req)
        .await
}

pub async fn create_sub_category(
    req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<CreateSubCategoryRequest>,
) -> ActixResult<HttpResponse> {
    CATEGORY_SERVICE
        .create_sub_category(id.into_inner(), body.into_inner(), &req)
        .await
}

// 配置路由（写操作在服务层校验审阅角色）
pub fn configure_category_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/categories")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::delete().to(delete_category))
            .route("/{id}/sub-categories", web::get().to(list_sub_categories))
            .route("/{id}/sub-categories", web::post().to(create_sub_category)),
    );
}
