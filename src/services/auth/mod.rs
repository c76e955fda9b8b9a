//! 登录与当前用户信息

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse, UserInfoResponse},
    users::entities::UserStatus,
};
use crate::utils::password::verify_password;

use super::{app_storage, current_user};

pub struct AuthService;

/// 账号不存在与密码错误返回同一条消息
fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "Username or password is incorrect",
    ))
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn login(
        &self,
        credentials: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = app_storage(request)?;
        let user = match storage
            .get_user_by_username_or_email(credentials.username.trim())
            .await?
        {
            Some(user) if verify_password(&credentials.password, &user.password_hash) => user,
            _ => return Ok(invalid_credentials()),
        };

        if user.status != UserStatus::Active {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::Forbidden,
                format!("Account is {}", user.status),
            )));
        }

        let access_token = match user.generate_access_token() {
            Ok(token) => token,
            Err(e) => {
                error!("Token generation failed for user {}: {}", user.id, e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        "Login failed, unable to generate token",
                    )),
                );
            }
        };

        // 登录时间写失败不影响本次登录
        if let Err(e) = storage.update_last_login(user.id).await {
            error!("Failed to update last login for user {}: {}", user.id, e);
        }

        info!("User {} ({}) logged in", user.username, user.role);
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            LoginResponse {
                access_token,
                expires_in: AppConfig::get().jwt.access_token_expiry * 60,
                user,
                created_at: chrono::Utc::now(),
            },
            "Login successful",
        )))
    }

    pub async fn me(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        )))
    }
}
