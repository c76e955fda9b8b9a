//! LAEMPL / MPS 表格汇总
//!
//! 同级提交的行按 `key` 对齐后逐列求和，`mps` 列是比率，取平均值。
//! 每轮都从本轮纳入的提交重新计算，不在上一轮结果上累加。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use super::selection::{Selection, require_title};
use super::{PeerUpdate, TablePlan, mark_included, release_pointing_at};
use crate::errors::{ReportError, Result};
use crate::models::consolidation::{PeerCandidate, TitleFallback};
use crate::models::submissions::{ReportFields, TableRow};

const AVERAGED_COLUMN: &str = "mps";

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Numeric::Int)
                .or_else(|| n.as_f64().map(Numeric::Float)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .map(Numeric::Int)
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Numeric::Float))
            }
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => match a.checked_add(b) {
                Some(sum) => Numeric::Int(sum),
                None => Numeric::Float(a as f64 + b as f64),
            },
            (a, b) => Numeric::Float(a.as_f64() + b.as_f64()),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

#[derive(Debug, Clone)]
enum Column {
    /// 只见过空值
    Blank(Value),
    Sum(Numeric),
    Average { sum: f64, count: u32 },
    /// 首个非数值内容
    Text(Value),
}

impl Column {
    fn start(name: &str, value: &Value) -> Self {
        if is_blank(value) {
            return Column::Blank(value.clone());
        }
        match Numeric::parse(value) {
            Some(n) if name.eq_ignore_ascii_case(AVERAGED_COLUMN) => Column::Average {
                sum: n.as_f64(),
                count: 1,
            },
            Some(n) => Column::Sum(n),
            None => Column::Text(value.clone()),
        }
    }

    fn accumulate(&mut self, name: &str, value: &Value) {
        if is_blank(value) {
            return;
        }
        match self {
            Column::Blank(_) => *self = Column::start(name, value),
            Column::Sum(total) => {
                if let Some(n) = Numeric::parse(value) {
                    *total = total.add(n);
                }
            }
            Column::Average { sum, count } => {
                if let Some(n) = Numeric::parse(value) {
                    *sum += n.as_f64();
                    *count += 1;
                }
            }
            Column::Text(_) => {}
        }
    }

    fn finish(self) -> Value {
        match self {
            Column::Blank(v) | Column::Text(v) => v,
            Column::Sum(Numeric::Int(i)) => Value::from(i),
            Column::Sum(Numeric::Float(f)) => float_value(round_to(f, 4)),
            Column::Average { sum, count } => float_value(round_to(sum / count as f64, 2)),
        }
    }
}

struct RowTotals {
    key: String,
    columns: Vec<(String, Column)>,
}

impl RowTotals {
    fn add(&mut self, columns: &Map<String, Value>) {
        for (name, value) in columns {
            match self.columns.iter_mut().find(|(n, _)| n == name) {
                Some((_, column)) => column.accumulate(name, value),
                None => self
                    .columns
                    .push((name.clone(), Column::start(name, value))),
            }
        }
    }

    fn finish(self) -> TableRow {
        TableRow {
            key: self.key,
            columns: self
                .columns
                .into_iter()
                .map(|(name, column)| (name, column.finish()))
                .collect(),
        }
    }
}

/// 按行键逐列汇总多张表格，行与列保持首次出现的顺序
pub fn sum_rows<'a>(tables: impl IntoIterator<Item = &'a [TableRow]>) -> Vec<TableRow> {
    let mut totals: Vec<RowTotals> = Vec::new();
    for rows in tables {
        for row in rows {
            let key = row.key.trim();
            match totals.iter_mut().find(|t| t.key == key) {
                Some(total) => total.add(&row.columns),
                None => {
                    let mut total = RowTotals {
                        key: key.to_string(),
                        columns: Vec::new(),
                    };
                    total.add(&row.columns);
                    totals.push(total);
                }
            }
        }
    }
    totals.into_iter().map(RowTotals::finish).collect()
}

fn peer_rows(peer: &PeerCandidate) -> &[TableRow] {
    peer.fields
        .as_ref()
        .and_then(ReportFields::as_table)
        .map(|t| t.rows.as_slice())
        .unwrap_or(&[])
}

/// 把选中的同级表格汇总进目标表格
///
/// 没有任何提交被纳入时保留目标原有的行
pub fn consolidate_table(
    target_id: i64,
    target: &ReportFields,
    title: &str,
    peers: &[PeerCandidate],
    selected_ids: Option<&[i64]>,
    fallback: TitleFallback,
    now: DateTime<Utc>,
) -> Result<TablePlan> {
    let title = require_title(title)?;
    let mut target_fields = target.clone();
    let table = target_fields
        .as_table_mut()
        .ok_or_else(|| ReportError::validation("目标提交不是 LAEMPL/MPS 表格"))?;
    let at = now.to_rfc3339();

    let selection = Selection::new(title, selected_ids, fallback);
    let chosen = selection.pick(peers);

    let mut released = Vec::new();
    let mut peer_updates: Vec<PeerUpdate> = Vec::new();
    if selection.is_explicit() {
        let chosen_ids: HashSet<i64> = chosen.iter().map(|p| p.submission_id).collect();
        let releases = release_pointing_at(
            target_id,
            peers
                .iter()
                .filter(|p| !chosen_ids.contains(&p.submission_id)),
        );
        released.extend(releases.iter().map(|u| u.submission_id));
        peer_updates.extend(releases);
    }

    let (included, marks) = mark_included(target_id, target, &chosen, &at);
    peer_updates.extend(marks);

    if !included.is_empty() {
        table.rows = sum_rows(chosen.iter().map(|p| peer_rows(p)));
    }
    table.meta.consolidated_at = Some(at);
    table.meta.consolidated_from = included.clone();

    let rows = table.rows.clone();
    Ok(TablePlan {
        target_fields,
        rows,
        included,
        released,
        peer_updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::test_support::peer;
    use chrono::TimeZone;
    use serde_json::json;

    fn row(value: Value) -> TableRow {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_sum_rows_by_key() {
        let a = vec![
            row(json!({"key": "Male", "enrolled": 20, "passed": 18})),
            row(json!({"key": "Female", "enrolled": 22, "passed": 21})),
        ];
        let b = vec![
            row(json!({"trait": "Female", "enrolled": 10, "passed": "9"})),
            row(json!({"key": "Male", "enrolled": 5, "passed": 5})),
        ];
        let rows = sum_rows([a.as_slice(), b.as_slice()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "Male");
        assert_eq!(rows[0].columns["enrolled"], 25);
        assert_eq!(rows[0].columns["passed"], 23);
        assert_eq!(rows[1].key, "Female");
        assert_eq!(rows[1].columns["passed"], 30);
    }

    #[test]
    fn test_mps_column_is_averaged() {
        let a = vec![row(json!({"key": "Math", "mps": 80, "total": 40}))];
        let b = vec![row(json!({"key": "Math", "mps": 70.5, "total": 35}))];
        let rows = sum_rows([a.as_slice(), b.as_slice()]);
        assert_eq!(rows[0].columns["mps"], 75.25);
        assert_eq!(rows[0].columns["total"], 75);
    }

    #[test]
    fn test_text_and_blank_cells() {
        let a = vec![row(json!({"key": "Math", "remarks": "good", "score": ""}))];
        let b = vec![row(json!({"key": "Math", "remarks": "fair", "score": 4}))];
        let rows = sum_rows([a.as_slice(), b.as_slice()]);
        assert_eq!(rows[0].columns["remarks"], "good");
        assert_eq!(rows[0].columns["score"], 4);
    }

    #[test]
    fn test_consolidate_table_recomputes_each_round() {
        let mut peers = vec![
            peer(10, r#"{"type":"LAEMPL","rows":[{"key":"Male","passed":3}]}"#),
            peer(11, r#"{"type":"LAEMPL","rows":[{"key":"Male","passed":4}]}"#),
        ];
        let target = ReportFields::decode(Some(r#"{"type":"LAEMPL_COORDINATOR"}"#)).unwrap();
        let first =
            consolidate_table(1, &target, "Q1", &peers, None, TitleFallback::MergeAll, now())
                .unwrap();
        assert_eq!(first.rows[0].columns["passed"], 7);
        for update in &first.peer_updates {
            if let Some(p) = peers.iter_mut().find(|p| p.submission_id == update.submission_id) {
                p.fields = Some(update.fields.clone());
            }
        }

        let selected = [11];
        let second = consolidate_table(
            1,
            &first.target_fields,
            "Q1",
            &peers,
            Some(&selected[..]),
            TitleFallback::MergeAll,
            now(),
        )
        .unwrap();
        assert_eq!(second.rows[0].columns["passed"], 4);
        assert_eq!(second.released, vec![10]);
        assert_eq!(second.target_fields.meta().consolidated_from, vec![11]);
    }

    #[test]
    fn test_fallback_skips_peers_of_other_report_kind() {
        let peers = vec![
            peer(10, r#"{"type":"LAEMPL","rows":[{"key":"Male","passed":3}]}"#),
            peer(12, r#"{"images":["a.jpg"]}"#),
        ];
        let target = ReportFields::decode(Some(r#"{"type":"LAEMPL_COORDINATOR"}"#)).unwrap();
        let plan = consolidate_table(1, &target, "Q1", &peers, None, TitleFallback::MergeAll, now())
            .unwrap();

        assert_eq!(plan.included, vec![10]);
        assert!(plan.peer_updates.iter().all(|u| u.submission_id != 12));
        assert_eq!(plan.rows[0].columns["passed"], 3);
    }

    #[test]
    fn test_accomplishment_target_rejected() {
        assert!(
            consolidate_table(
                1,
                &ReportFields::default(),
                "Q1",
                &[],
                None,
                TitleFallback::MergeAll,
                now()
            )
            .is_err()
        );
    }
}
