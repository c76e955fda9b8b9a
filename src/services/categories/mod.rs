//! 报告分类与子分类
//!
//! 分类只有名称，不做层级以外的校验。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::ReportError;
use crate::models::{
    ApiResponse, ErrorCode,
    categories::requests::{CreateCategoryRequest, CreateSubCategoryRequest},
};

use super::{app_storage, current_user, ensure_reviewer};

pub struct CategoryService;

fn require_name(name: &str) -> Result<&str, ReportError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ReportError::validation("Category name is required"));
    }
    Ok(name)
}

impl CategoryService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn list_categories(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let categories = app_storage(request)?.list_categories().await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            categories,
            "Categories retrieved successfully",
        )))
    }

    pub async fn create_category(
        &self,
        req: CreateCategoryRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        ensure_reviewer(&current_user(request)?)?;
        let name = require_name(&req.name)?;
        let category = app_storage(request)?.create_category(name).await?;
        info!("Category {} created: {}", category.id, category.name);
        Ok(HttpResponse::Created().json(ApiResponse::success(category, "Category created")))
    }

    pub async fn delete_category(
        &self,
        category_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        ensure_reviewer(&current_user(request)?)?;
        if app_storage(request)?.delete_category(category_id).await? {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Category deleted")))
        } else {
            Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::CategoryNotFound,
                format!("Category {category_id} not found"),
            )))
        }
    }

    pub async fn list_sub_categories(
        &self,
        category_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let items = app_storage(request)?
            .list_sub_categories(category_id)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Sub-categories retrieved successfully",
        )))
    }

    pub async fn create_sub_category(
        &self,
        category_id: i64,
        req: CreateSubCategoryRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        ensure_reviewer(&current_user(request)?)?;
        let name = require_name(&req.name)?;
        let storage = app_storage(request)?;
        if storage.get_category_by_id(category_id).await?.is_none() {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::CategoryNotFound,
                format!("Category {category_id} not found"),
            )));
        }
        let sub_category = storage.create_sub_category(category_id, name).await?;
        Ok(HttpResponse::Created().json(ApiResponse::success(
            sub_category,
            "Sub-category created",
        )))
    }
}
