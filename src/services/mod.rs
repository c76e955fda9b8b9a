pub mod auth;
pub mod categories;
pub mod notifications;
pub mod report_assignments;
pub mod reports;
pub mod submissions;
pub mod system;
pub mod users;

pub use auth::AuthService;
pub use categories::CategoryService;
pub use notifications::NotificationService;
pub use report_assignments::ReportAssignmentService;
pub use reports::ReportService;
pub use submissions::SubmissionService;
pub use system::SystemService;
pub use users::UserService;

use actix_web::{HttpRequest, web};
use std::sync::Arc;

use crate::errors::{ReportError, Result};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

/// 从应用数据中取出存储实例
pub(crate) fn app_storage(request: &HttpRequest) -> Result<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| ReportError::database_connection("Storage not found in app data"))
}

/// 当前登录用户，路由未挂 RequireJWT 时视为未认证
pub(crate) fn current_user(request: &HttpRequest) -> Result<User> {
    RequireJWT::current_user(request)
        .ok_or_else(|| ReportError::authentication("Authentication required"))
}

/// 写操作限审阅角色（协调员、校长、管理员）
pub(crate) fn ensure_reviewer(user: &User) -> Result<()> {
    if UserRole::reviewer_roles().contains(&&user.role) {
        Ok(())
    } else {
        Err(ReportError::authorization(format!(
            "Role {} is not allowed to perform this action",
            user.role
        )))
    }
}
