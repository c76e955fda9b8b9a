use super::entities::{UserProfile, UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

/// 用户列表筛选，`search` 同时匹配用户名、邮箱与显示名
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListQuery {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

/// 管理员建号；到达存储层时 `password` 已是哈希
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub profile: UserProfile,
}
