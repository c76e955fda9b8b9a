//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod categories;
pub mod notifications;
pub mod report_assignments;
pub mod sub_categories;
pub mod submissions;
pub mod users;

use chrono::{DateTime, Utc};

/// 库中时间统一存 Unix 秒，越界值回落到纪元起点
pub(crate) fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}
