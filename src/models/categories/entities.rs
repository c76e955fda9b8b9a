use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 报告分类
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 报告子分类
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/category.ts")]
pub struct SubCategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
