use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum::string_enum;

/// 报告类型，同时也是提交 `fields` 的 `type` 判别值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub enum ReportType {
    Accomplishment,
    Mps,
    Laempl,
    LaemplCoordinator,
}

string_enum!(ReportType, "报告类型" {
    Accomplishment => "ACCOMPLISHMENT",
    Mps => "MPS",
    Laempl => "LAEMPL",
    LaemplCoordinator => "LAEMPL_COORDINATOR",
});

/// 报告任务
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report_assignment.ts")]
pub struct ReportAssignment {
    pub id: i64,
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    // 协调员汇总场景下的父任务
    pub parent_report_assignment_id: Option<i64>,
    // 负责汇总的协调员
    pub coordinator_id: Option<i64>,
    pub report_type: ReportType,
    pub title: String,
    pub instruction: Option<String>,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub given_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
