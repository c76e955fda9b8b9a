use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::ReportError;
use crate::models::{
    ApiResponse, report_assignments::requests::CreateReportAssignmentRequest,
};
use crate::services::{app_storage, current_user, ensure_reviewer};

pub async fn create_assignment(
    mut req: CreateReportAssignmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    ensure_reviewer(&user)?;

    req.title = req.title.trim().to_string();
    if req.title.is_empty() {
        return Err(ReportError::validation("Assignment title is required").into());
    }
    if req.recipients.is_empty() {
        return Err(ReportError::validation("At least one recipient is required").into());
    }
    if req.parent_report_assignment_id.is_some_and(|id| id <= 0) {
        return Err(ReportError::validation("Invalid parent report assignment").into());
    }

    let storage = app_storage(request)?;
    let created = storage.create_report_assignment(user.id, req).await?;
    info!(
        "Report assignment {} given by {} to {} recipient(s)",
        created.assignment.id,
        user.id,
        created.submission_ids.len()
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(
        created,
        "Report assignment created",
    )))
}
