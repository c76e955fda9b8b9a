use serde::Deserialize;
use ts_rs::TS;

/// 同级提交查询参数
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct PeerQuery {
    pub ra: Option<i64>,
    pub pra: Option<i64>,
    #[serde(rename = "includeConsolidated")]
    pub include_consolidated: Option<bool>,
}

/// 汇总请求
///
/// `submission_ids` 非空时为显式选择，否则按标题匹配
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct ConsolidateRequest {
    pub title: Option<String>,
    pub submission_ids: Option<Vec<i64>>,
    pub report_assignment_id: Option<i64>,
    pub parent_assignment_id: Option<i64>,
}
