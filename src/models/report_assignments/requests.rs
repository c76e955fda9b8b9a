use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::ReportType;
use crate::models::common::PaginationQuery;

/// 创建报告任务请求（同时为每个接收人生成空白提交）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub struct CreateReportAssignmentRequest {
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub coordinator_id: Option<i64>,
    pub report_type: ReportType,
    pub title: String,
    pub instruction: Option<String>,
    pub deadline: Option<DateTime<Utc>>, // ISO 8601 格式
    pub recipients: Vec<i64>,
}

/// 报告任务列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub struct ReportAssignmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub category_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub given_by: Option<i64>,
}
