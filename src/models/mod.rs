pub mod auth;
pub mod categories;
pub mod common;
pub mod consolidation;
pub mod notifications;
pub mod report_assignments;
pub mod submissions;
pub mod system;
pub mod users;

pub use common::error_code::ErrorCode;
pub use common::pagination::{PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
