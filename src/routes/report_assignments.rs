use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::report_assignments::requests::{
    CreateReportAssignmentRequest, ReportAssignmentListParams,
};
use crate::services::ReportAssignmentService;

static REPORT_ASSIGNMENT_SERVICE: Lazy<ReportAssignmentService> =
    Lazy::new(ReportAssignmentService::new_lazy);

pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<ReportAssignmentListParams>,
) -> ActixResult<HttpResponse> {
    REPORT_ASSIGNMENT_SERVICE
        .list_assignments(query.into_inner(), &req)
        .await
}

pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<CreateReportAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    REPORT_ASSIGNMENT_SERVICE
        .create_assignment(body.into_inner(), &req)
        .await
}

pub async fn get_assignment(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    REPORT_ASSIGNMENT_SERVICE
        .get_assignment(id.into_inner(), &req)
        .await
}

pub async fn delete_assignment(
    req: HttpRequest,
    id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    REPORT_ASSIGNMENT_SERVICE
        .delete_assignment(id.into_inner(), &req)
        .await
}

pub async fn status_counts(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    REPORT_ASSIGNMENT_SERVICE
        .status_counts(id.into_inner(), &req)
        .await
}

pub fn configure_report_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/report-assignments")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_assignments))
            .route("", web::post().to(create_assignment))
            .route("/{id}", web::get().to(get_assignment))
            .route("/{id}", web::delete().to(delete_assignment))
            .route("/{id}/status-counts", web::get().to(status_counts)),
    );
}
