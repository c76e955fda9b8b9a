use super::entities::User;
use crate::models::common::pagination::PaginatedResponse;
use serde::Serialize;
use ts_rs::TS;

pub type UserListResponse = PaginatedResponse<User>;

// 单个用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserResponse {
    pub user: User,
}
