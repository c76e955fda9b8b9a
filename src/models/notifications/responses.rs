use serde::Serialize;
use ts_rs::TS;

use super::entities::Notification;
use crate::models::common::pagination::PaginatedResponse;

pub type NotificationListResponse = PaginatedResponse<Notification>;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// `read-all` 实际翻转的条数，已读的不计入
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct MarkAllReadResponse {
    pub marked_count: i64,
}
