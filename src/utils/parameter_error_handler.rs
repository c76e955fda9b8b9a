use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

/// JSON 请求体解析失败时返回统一格式的 400
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    debug!("JSON 解析失败 {}: {}", req.path(), err);
    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type 必须为 application/json".to_string(),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "请求体过大".to_string()
        }
        _ => format!("请求体格式错误: {err}"),
    };
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message));
    InternalError::from_response(err, response).into()
}

/// 查询参数解析失败时返回统一格式的 400
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    debug!("查询参数解析失败 {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("查询参数错误: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
