pub mod create;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    report_assignments::requests::{CreateReportAssignmentRequest, ReportAssignmentListParams},
};

use super::{app_storage, current_user, ensure_reviewer};

pub struct ReportAssignmentService;

fn assignment_not_found(id: i64) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::ReportAssignmentNotFound,
        format!("Report assignment {id} not found"),
    ))
}

impl ReportAssignmentService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 分派任务
    pub async fn create_assignment(
        &self,
        req: CreateReportAssignmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(req, request).await
    }

    pub async fn list_assignments(
        &self,
        query: ReportAssignmentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let response = app_storage(request)?.list_report_assignments(query).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Report assignments retrieved successfully",
        )))
    }

    pub async fn get_assignment(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match app_storage(request)?.get_report_assignment_by_id(id).await? {
            Some(assignment) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                assignment,
                "Report assignment retrieved successfully",
            ))),
            None => Ok(assignment_not_found(id)),
        }
    }

    // 删除任务（连同其下的提交）
    pub async fn delete_assignment(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        ensure_reviewer(&current_user(request)?)?;
        if app_storage(request)?.delete_report_assignment(id).await? {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Report assignment deleted")))
        } else {
            Ok(assignment_not_found(id))
        }
    }

    // 各状态提交数量
    pub async fn status_counts(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = app_storage(request)?;
        if storage.get_report_assignment_by_id(id).await?.is_none() {
            return Ok(assignment_not_found(id));
        }
        let counts = storage.get_assignment_status_counts(id).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            counts,
            "Status counts retrieved successfully",
        )))
    }
}
