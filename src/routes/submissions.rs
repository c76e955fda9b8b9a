use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{PatchSubmissionRequest, SubmissionListQuery};
use crate::services::SubmissionService;

static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

pub async fn list_submissions(
    req: HttpRequest,
    query: web::Query<SubmissionListQuery>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(query.into_inner(), &req)
        .await
}

pub async fn get_submission(req: HttpRequest, id: web::Path<i64>) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_submission(id.into_inner(), &req).await
}

pub async fn patch_submission(
    req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<PatchSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .patch_submission(id.into_inner(), body.into_inner(), &req)
        .await
}

pub async fn delete_submission(
    req: HttpRequest,
    id: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .delete_submission(id.into_inner(), &req)
        .await
}

pub fn configure_submission_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_submissions))
            .route("/{id}", web::get().to(get_submission))
            .route("/{id}", web::patch().to(patch_submission))
            .route("/{id}", web::delete().to(delete_submission)),
    );
}
