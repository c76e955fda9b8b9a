use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::ErrorCode;

/// 所有接口共用的响应信封，`data` 为空时不出现在 JSON 中
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    fn compose(code: ErrorCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::compose(ErrorCode::Success, message, Some(data))
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self::compose(ErrorCode::Success, message, None)
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::compose(code, message, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::error_empty(
            ErrorCode::SubmissionFieldsInvalid,
            "bad fields",
        ))
        .unwrap();
        assert_eq!(body["code"], ErrorCode::SubmissionFieldsInvalid as i32);
        assert_eq!(body["message"], "bad fields");
        assert!(body.get("data").is_none());

        let body = serde_json::to_value(ApiResponse::success(3_i64, "ok")).unwrap();
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"], 3);
    }
}
