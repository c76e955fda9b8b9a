//! 统一错误类型
//!
//! 每个变体在下方表格中登记日志代码、类型名、HTTP 状态与业务错误码，
//! 宏据此生成枚举、访问方法与 snake_case 构造函数。

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use std::fmt;

use crate::models::{ApiResponse, ErrorCode};

macro_rules! report_errors {
    ($(
        $variant:ident => $code:literal, $label:literal, $status:ident, $api:ident;
    )*) => {
        #[derive(Debug, Clone)]
        pub enum ReportError {
            $($variant(String),)*
        }

        impl ReportError {
            /// 日志用的稳定代码，如 `E005`
            pub fn code(&self) -> &'static str {
                match self {
                    $(ReportError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ReportError::$variant(_) => $label,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(ReportError::$variant(msg) => msg,)*
                }
            }

            pub fn status_code(&self) -> StatusCode {
                match self {
                    $(ReportError::$variant(_) => StatusCode::$status,)*
                }
            }

            pub fn error_code(&self) -> ErrorCode {
                match self {
                    $(ReportError::$variant(_) => ErrorCode::$api,)*
                }
            }
        }

        paste::paste! {
            impl ReportError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ReportError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

report_errors! {
    CacheConnection => "E001", "Cache Connection Error", INTERNAL_SERVER_ERROR, InternalServerError;
    DatabaseConfig => "E003", "Database Configuration Error", INTERNAL_SERVER_ERROR, InternalServerError;
    DatabaseConnection => "E004", "Database Connection Error", INTERNAL_SERVER_ERROR, InternalServerError;
    DatabaseOperation => "E005", "Database Operation Error", INTERNAL_SERVER_ERROR, InternalServerError;
    Validation => "E007", "Validation Error", BAD_REQUEST, BadRequest;
    NotFound => "E008", "Resource Not Found", NOT_FOUND, NotFound;
    Serialization => "E009", "Serialization Error", INTERNAL_SERVER_ERROR, InternalServerError;
    Authentication => "E011", "Authentication Error", UNAUTHORIZED, Unauthorized;
    Authorization => "E012", "Authorization Error", FORBIDDEN, Forbidden;
    FieldsDecode => "E013", "Submission Fields Decode Error", BAD_REQUEST, SubmissionFieldsInvalid;
}

impl actix_web::ResponseError for ReportError {
    fn status_code(&self) -> StatusCode {
        ReportError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::error_empty(self.error_code(), self.message()))
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for ReportError {}

impl From<sea_orm::DbErr> for ReportError {
    fn from(err: sea_orm::DbErr) -> Self {
        ReportError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_error_codes() {
        assert_eq!(ReportError::cache_connection("test").code(), "E001");
        assert_eq!(ReportError::database_config("test").code(), "E003");
        assert_eq!(ReportError::validation("test").code(), "E007");
        assert_eq!(ReportError::authentication("test").code(), "E011");
        assert_eq!(ReportError::fields_decode("test").code(), "E013");
    }

    #[test]
    fn test_status_and_api_code_mapping() {
        let cases = [
            (ReportError::validation("title is required"), StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
            (ReportError::not_found("submission"), StatusCode::NOT_FOUND, ErrorCode::NotFound),
            (
                ReportError::database_operation("deadlock"),
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
            ),
            (ReportError::authorization("role"), StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            (
                ReportError::fields_decode("bad rows"),
                StatusCode::BAD_REQUEST,
                ErrorCode::SubmissionFieldsInvalid,
            ),
        ];
        for (err, status, api) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.error_code(), api, "{err}");
        }
    }

    #[test]
    fn test_display_and_response() {
        let err = ReportError::validation("Missing title");
        assert_eq!(err.to_string(), "Validation Error: Missing title");
        assert_eq!(err.message(), "Missing title");
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }
}
