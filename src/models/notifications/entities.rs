use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum::string_enum;

// 通知类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub enum NotificationType {
    ReportAssigned,     // 收到新的报告任务
    SubmissionRejected, // 提交被退回
    SubmissionApproved, // 提交已通过
}

string_enum!(NotificationType, "通知类型" {
    ReportAssigned => "report_assigned",
    SubmissionRejected => "submission_rejected",
    SubmissionApproved => "submission_approved",
});

// 通知实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub content: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
