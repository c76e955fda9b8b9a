use serde::Serialize;
use ts_rs::TS;

use super::entities::ReportAssignment;
use crate::models::common::pagination::PaginatedResponse;

/// 创建报告任务响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub struct CreateReportAssignmentResponse {
    pub assignment: ReportAssignment,
    pub submission_ids: Vec<i64>,
}

pub type ReportAssignmentListResponse = PaginatedResponse<ReportAssignment>;

/// 任务下各状态的提交数量
#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub struct AssignmentStatusCounts {
    pub report_assignment_id: i64,
    pub total: i64,
    pub draft: i64,
    pub pending: i64,
    pub submitted: i64,
    pub approved: i64,
    pub rejected: i64,
}
