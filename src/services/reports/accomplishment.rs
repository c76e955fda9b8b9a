use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{consolidation_input, peer_filter};
use crate::consolidation::{listing, require_title};
use crate::models::{
    ApiResponse,
    consolidation::{
        requests::{ConsolidateRequest, PeerQuery},
        responses::ConsolidateResponse,
    },
};
use crate::services::{app_storage, current_user};

/// 候选同级提交，按标题分组
///
/// 列出之前先清理指向空目标的陈旧标记，否则这些提交永远不会再被列出
pub async fn list_peers(
    target_id: i64,
    query: PeerQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = app_storage(request)?;
    let filter = peer_filter(
        &user,
        query.ra,
        query.pra,
        query.include_consolidated.unwrap_or(false),
    );

    storage
        .clear_stale_consolidation_flags(target_id, filter.clone())
        .await?;
    let peers = storage.list_peer_candidates(target_id, filter).await?;
    debug!(
        "Submission {}: {} peer candidates for user {}",
        target_id,
        peers.len(),
        user.id
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        listing::group_by_title(&peers),
        "Peer submissions retrieved successfully",
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
        .consolidate_accomplishment(target_id, input)
        .await?;

    let response = ConsolidateResponse {
        ok: true,
        count: plan.images.len(),
        images: plan.images,
        consolidated_from: plan.included,
        released: plan.released,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Consolidation completed")))
}

/// 撤销全部汇总，目标图片回到汇总前的自有图片
pub async fn release_all(
    target_id: i64,
    query: PeerQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let filter = peer_filter(&user, query.ra, query.pra, true);
    let plan = app_storage(request)?
        .release_accomplishment(target_id, filter)
        .await?;

    let response = ConsolidateResponse {
        ok: true,
        count: plan.images.len(),
        images: plan.images,
        consolidated_from: plan.included,
        released: plan.released,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Consolidation released")))
}

/// 叙述汇总素材，包含已被汇总的同级提交
pub async fn summary_sources(
    target_id: i64,
    query: PeerQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = current_user(request)?;
    let filter = peer_filter(&user, query.ra, query.pra, true);
    let peers = app_storage(request)?
        .list_peer_candidates(target_id, filter)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        listing::summary_sources(&peers),
        "Summary sources retrieved successfully",
    )))
}
