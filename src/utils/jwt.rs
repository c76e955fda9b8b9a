use crate::config::AppConfig;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // 用户 ID
    pub role: String, // 用户角色
    pub exp: usize,   // 过期时间戳
    pub iat: usize,   // 签发时间
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub struct JwtUtils;

impl JwtUtils {
    /// 生成 Access Token，有效期取自配置（分钟）
    pub fn generate_access_token(
        user_id: i64,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let config = AppConfig::get();
        Self::sign(
            user_id,
            role,
            chrono::Duration::minutes(config.jwt.access_token_expiry),
            &config.jwt.secret,
        )
    }

    /// 验证 Access Token
    pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::verify(token, &AppConfig::get().jwt.secret)
    }

    fn sign(
        user_id: i64,
        role: &str,
        expiry: chrono::Duration,
        secret: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    /// 从 `Authorization: Bearer <token>` 头中取出令牌
    pub fn extract_bearer_token(req: &actix_web::HttpRequest) -> Option<String> {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_sign_and_verify() {
        let token = JwtUtils::sign(42, "coordinator", chrono::Duration::minutes(5), "s3cret")
            .unwrap();
        let claims = JwtUtils::verify(&token, "s3cret").unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, "coordinator");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token =
            JwtUtils::sign(1, "teacher", chrono::Duration::minutes(5), "right").unwrap();
        assert!(JwtUtils::verify(&token, "wrong").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token =
            JwtUtils::sign(1, "teacher", chrono::Duration::minutes(-10), "s3cret").unwrap();
        assert!(JwtUtils::verify(&token, "s3cret").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(
            JwtUtils::extract_bearer_token(&req).as_deref(),
            Some("abc.def")
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic xyz"))
            .to_http_request();
        assert!(JwtUtils::extract_bearer_token(&req).is_none());
    }
}
