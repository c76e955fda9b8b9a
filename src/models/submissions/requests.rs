use serde::Deserialize;
use serde_json::Value;
use ts_rs::TS;

use crate::models::common::PaginationQuery;

/// 局部更新提交
///
/// `fields` 与已有载荷做浅合并，合并结果必须能按其 `type` 解码
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct PatchSubmissionRequest {
    pub status: Option<i32>,
    pub value: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub fields: Option<Value>,
}

/// 提交列表筛选，`status` 取 SubmissionStatus 的数字代码
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListQuery {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub report_assignment_id: Option<i64>,
    pub submitted_by: Option<i64>,
    pub status: Option<i32>,
}
