use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

use crate::models::submissions::{ImageRef, TableRow};

/// 分组内的单个同级提交
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct PeerSubmission {
    pub submission_id: i64,
    pub report_assignment_id: i64,
    pub teacher_name: String,
    pub title: String,
    #[ts(type = "Array<unknown>")]
    pub images: Vec<ImageRef>,
    pub narrative: Option<String>,
    pub fields: Option<Value>,
    pub consolidated_into: Option<i64>,
}

/// 按标题分组的同级提交
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct PeerGroup {
    pub title: String,
    pub images: Vec<String>,
    pub submissions: Vec<PeerSubmission>,
}

/// 成果报告汇总结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct ConsolidateResponse {
    pub ok: bool,
    #[ts(type = "Array<unknown>")]
    pub images: Vec<ImageRef>,
    pub count: usize,
    pub consolidated_from: Vec<i64>,
    pub released: Vec<i64>,
}

/// 叙述汇总的素材
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct SummarySource {
    pub submission_id: i64,
    pub teacher_name: String,
    pub title: String,
    pub narrative: Option<String>,
    pub consolidated_into: Option<i64>,
}

/// 表格类同级提交
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct TablePeerSubmission {
    pub submission_id: i64,
    pub report_assignment_id: i64,
    pub teacher_name: String,
    pub title: String,
    #[ts(type = "Array<Record<string, unknown>>")]
    pub rows: Vec<TableRow>,
    pub consolidated_into: Option<i64>,
}

/// 表格汇总结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/consolidation.ts")]
pub struct TableConsolidateResponse {
    pub ok: bool,
    #[ts(type = "Array<Record<string, unknown>>")]
    pub rows: Vec<TableRow>,
    pub count: usize,
    pub consolidated_from: Vec<i64>,
    pub released: Vec<i64>,
}
