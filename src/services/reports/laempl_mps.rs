use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{consolidation_input, peer_filter};
use crate::consolidation::{listing, require_title};
use crate::models::{
    ApiResponse,
    consolidation::{
        requests::{ConsolidateRequest, PeerQuery},
        responses::TableConsolidateResponse,
    },
};
use crate::services::{app_storage, current_user};

pub async fn list_peers(
    target_id: i64,
    query: PeerQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let filter = peer_filter(
        &user,
        query.ra,
        query.pra,
        query.include_consolidated.unwrap_or(false),
    );
    let peers = app_storage(request)?
        .list_peer_candidates(target_id, filter)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        listing::table_peers(&peers),
        "Peer tables retrieved successfully",
    )))
}

pub async fn consolidate(
    target_id: i64,
    req: ConsolidateRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let raw_title = req.title.clone().unwrap_or_default();
    let title = require_title(&raw_title)?;
    let input = consolidation_input(&user, title, req);

    let plan = app_storage(request)?
        .consolidate_table(target_id, input)
        .await?;

    let response = TableConsolidateResponse {
        ok: true,
        count: plan.included.len(),
        rows: plan.rows,
        consolidated_from: plan.included,
        released: plan.released,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Table consolidation completed",
    )))
}
