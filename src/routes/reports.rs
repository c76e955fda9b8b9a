use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::consolidation::requests::{ConsolidateRequest, PeerQuery};
use crate::models::users::entities::UserRole;
use crate::services::ReportService;

static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn accomplishment_peers(
    req: HttpRequest,
    id: web::Path<i64>,
    query: web::Query<PeerQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .accomplishment_peers(id.into_inner(), query.into_inner(), &req)
        .await
}

pub async fn consolidate_accomplishment(
    req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<ConsolidateRequest>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .consolidate_accomplishment(id.into_inner(), body.into_inner(), &req)
        .await
}

pub async fn release_accomplishment(
    req: HttpRequest,
    id: web::Path<i64>,
    query: web::Query<PeerQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .release_accomplishment(id.into_inner(), query.into_inner(), &req)
        .await
}

pub async fn summary_sources(
    req: HttpRequest,
    id: web::Path<i64>,
    query: web::Query<PeerQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .summary_sources(id.into_inner(), query.into_inner(), &req)
        .await
}

pub async fn table_peers(
    req: HttpRequest,
    id: web::Path<i64>,
    query: web::Query<PeerQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .table_peers(id.into_inner(), query.into_inner(), &req)
        .await
}

pub async fn consolidate_table(
    req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<ConsolidateRequest>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .consolidate_table(id.into_inner(), body.into_inner(), &req)
        .await
}

// 汇总相关接口仅对审阅角色开放，写接口额外限流
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reports")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::reviewer_roles()))
                    .route(
                        "/accomplishment/{id}/peers",
                        web::get().to(accomplishment_peers),
                    )
                    .route(
                        "/accomplishment/{id}/summary-sources",
                        web::get().to(summary_sources),
                    )
                    .service(
                        web::resource("/accomplishment/{id}/consolidate")
                            .wrap(middlewares::RateLimit::consolidation())
                            .route(web::post().to(consolidate_accomplishment))
                            .route(web::delete().to(release_accomplishment)),
                    )
                    .route("/laempl-mps/{id}/peers", web::get().to(table_peers))
                    .service(
                        web::resource("/laempl-mps/{id}/consolidate")
                            .wrap(middlewares::RateLimit::consolidation())
                            .route(web::post().to(consolidate_table)),
                    ),
            ),
    );
}
