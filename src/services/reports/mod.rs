//! 同级提交汇总接口
//!
//! 成果报告（图片 + 叙述）与 LAEMPL/MPS 表格共用同一套查找范围与可见性规则。

pub mod accomplishment;
pub mod laempl_mps;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::models::{
    consolidation::{
        ConsolidationInput, PeerFilter, PeerScope, TitleFallback,
        requests::{ConsolidateRequest, PeerQuery},
    },
    users::entities::User,
};

pub struct ReportService;

/// 根据请求者和查询参数构造查找条件
pub(crate) fn peer_filter(
    user: &User,
    ra: Option<i64>,
    pra: Option<i64>,
    include_consolidated: bool,
) -> PeerFilter {
    PeerFilter {
        requester_role: user.role.clone(),
        scope: PeerScope::from_params(ra, pra),
        include_consolidated,
        accomplishment_category_id: AppConfig::get().consolidation.accomplishment_category_id,
    }
}

/// 汇总请求转为引擎输入，标题已校验非空
pub(crate) fn consolidation_input(
    user: &User,
    title: &str,
    req: ConsolidateRequest,
) -> ConsolidationInput {
    ConsolidationInput {
        title: title.to_string(),
        selected_ids: req.submission_ids,
        filter: peer_filter(
            user,
            req.report_assignment_id,
            req.parent_assignment_id,
            false,
        ),
        fallback: TitleFallback::from(AppConfig::get().consolidation.title_fallback),
    }
}

impl ReportService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn accomplishment_peers(
        &self,
        target_id: i64,
        query: PeerQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        accomplishment::list_peers(target_id, query, request).await
    }

    pub async fn consolidate_accomplishment(
        &self,
        target_id: i64,
        req: ConsolidateRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        accomplishment::consolidate(target_id, req, request).await
    }

    pub async fn release_accomplishment(
        &self,
        target_id: i64,
        query: PeerQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        accomplishment::release_all(target_id, query, request).await
    }

    pub async fn summary_sources(
        &self,
        target_id: i64,
        query: PeerQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        accomplishment::summary_sources(target_id, query, request).await
    }

    pub async fn table_peers(
        &self,
        target_id: i64,
        query: PeerQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        laempl_mps::list_peers(target_id, query, request).await
    }

    pub async fn consolidate_table(
        &self,
        target_id: i64,
        req: ConsolidateRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        laempl_mps::consolidate(target_id, req, request).await
    }
}
