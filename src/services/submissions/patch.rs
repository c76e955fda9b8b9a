use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::{
    ensure_can_modify, ensure_can_set_status, notify::status_notification, submission_not_found,
};
use crate::models::{ApiResponse, submissions::requests::PatchSubmissionRequest};
use crate::services::{app_storage, current_user};

pub async fn patch_submission(
    id: i64,
    req: PatchSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = app_storage(request)?;

    let Some(existing) = storage.get_submission_by_id(id).await? else {
        return Ok(submission_not_found(id));
    };
    ensure_can_modify(&user, &existing)?;
    ensure_can_set_status(&user, req.status)?;

    let Some((previous_status, updated)) = storage.patch_submission(id, req).await? else {
        return Ok(submission_not_found(id));
    };

    if previous_status != updated.status {
        info!(
            "Submission {} status {} -> {} by user {}",
            id, previous_status, updated.status, user.id
        );
    }

    // 通知失败不影响本次更新
    if let Some(notification) = status_notification(previous_status, &updated) {
        actix_web::rt::spawn(async move {
            if let Err(e) = storage.create_notification(notification).await {
                warn!("Failed to create status notification for submission {}: {}", id, e);
            }
        });
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "Submission updated")))
}
