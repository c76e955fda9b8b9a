use serde::Deserialize;
use ts_rs::TS;

/// 创建分类请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// 创建子分类请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct CreateSubCategoryRequest {
    pub name: String,
}
