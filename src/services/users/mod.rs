//! 账号管理，仅管理员可达

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        requests::{CreateUserRequest, UserListQuery},
        responses::UserResponse,
    },
};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

use super::app_storage;

pub struct UserService;

/// 按用户名、邮箱、密码的顺序返回第一个不合格项
fn first_invalid_field(req: &CreateUserRequest) -> Option<(ErrorCode, String)> {
    validate_username(&req.username)
        .err()
        .map(|msg| (ErrorCode::UserNameInvalid, msg.to_string()))
        .or_else(|| {
            validate_email(&req.email)
                .err()
                .map(|msg| (ErrorCode::UserEmailInvalid, msg.to_string()))
        })
        .or_else(|| {
            validate_password(&req.password)
                .err()
                .map(|msg| (ErrorCode::UserPasswordInvalid, msg))
        })
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn list_users(
        &self,
        query: UserListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let page = app_storage(request)?
            .list_users_with_pagination(query)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(page, "Users retrieved successfully")))
    }

    /// 用户名与邮箱都不能与已有账号重复
    pub async fn create_user(
        &self,
        mut req: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Some((code, msg)) = first_invalid_field(&req) {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
        }

        let storage = app_storage(request)?;
        for identifier in [&req.username, &req.email] {
            if storage.get_user_by_username_or_email(identifier).await?.is_some() {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Username or email already exists",
                )));
            }
        }

        req.password = hash_password(&req.password)?;
        let user = storage.create_user(req).await?;
        info!("User {} created with role {}", user.username, user.role);
        Ok(HttpResponse::Created().json(ApiResponse::success(UserResponse { user }, "User created")))
    }

    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match app_storage(request)?.get_user_by_id(user_id).await? {
            Some(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "User retrieved successfully",
            ))),
            None => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                format!("User {user_id} not found"),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserProfile, UserRole};

    fn request(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: UserRole::Teacher,
            profile: UserProfile {
                profile_name: "Maria Santos".to_string(),
                avatar_url: None,
            },
        }
    }

    #[test]
    fn test_first_invalid_field_order() {
        let valid = request("m.santos", "m.santos@deped.gov.ph", "Sampaguita9");
        assert!(first_invalid_field(&valid).is_none());

        let (code, _) = first_invalid_field(&request("m", "not-an-email", "weak")).unwrap();
        assert_eq!(code, ErrorCode::UserNameInvalid);

        let (code, _) = first_invalid_field(&request("m.santos", "not-an-email", "weak")).unwrap();
        assert_eq!(code, ErrorCode::UserEmailInvalid);

        let (code, _) =
            first_invalid_field(&request("m.santos", "m.santos@deped.gov.ph", "weak")).unwrap();
        assert_eq!(code, ErrorCode::UserPasswordInvalid);
    }
}
