//! 同级提交汇总引擎
//!
//! 纯计算，不做任何 I/O：输入目标提交的载荷与候选同级提交，
//! 输出需要写回的目标载荷和同级提交载荷。事务与加锁由存储层负责。

pub mod accomplishment;
pub mod images;
pub mod listing;
pub mod selection;
pub mod tables;
pub mod visibility;

pub use accomplishment::{consolidate_accomplishment, release_accomplishment};
pub use selection::{Selection, normalize_title, require_title};
pub use tables::{consolidate_table, sum_rows};
pub use visibility::{PeerVisibility, is_offered};

use crate::models::consolidation::PeerCandidate;
use crate::models::submissions::{ImageRef, ReportFields, TableRow};

/// 需要写回的同级提交载荷
#[derive(Debug, Clone, PartialEq)]
pub struct PeerUpdate {
    pub submission_id: i64,
    pub fields: ReportFields,
}

/// 成果报告汇总计划
#[derive(Debug, Clone)]
pub struct AccomplishmentPlan {
    pub target_fields: ReportFields,
    pub images: Vec<ImageRef>,
    /// 本轮纳入（且可解码）的同级提交
    pub included: Vec<i64>,
    /// 本轮被释放的同级提交
    pub released: Vec<i64>,
    pub peer_updates: Vec<PeerUpdate>,
}

/// 表格汇总计划
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub target_fields: ReportFields,
    pub rows: Vec<TableRow>,
    pub included: Vec<i64>,
    pub released: Vec<i64>,
    pub peer_updates: Vec<PeerUpdate>,
}

/// 目标提交没有任何已汇总内容时，清除仍指向它的同级标记
///
/// 处理历史上汇总后又被清空的目标，使对应同级提交重新出现在候选列表中
pub fn stale_flag_updates(
    target_id: i64,
    target: &ReportFields,
    peers: &[PeerCandidate],
) -> Vec<PeerUpdate> {
    let recorded = target.meta().consolidated_images_count.unwrap_or(0);
    let has_payload = match target {
        ReportFields::Accomplishment(f) => !f.current_images().is_empty(),
        _ => target.as_table().is_some_and(|t| !t.rows.is_empty()),
    };
    if recorded != 0 || has_payload {
        return Vec::new();
    }

    release_pointing_at(target_id, peers.iter())
}

/// 清除所有指向 `target_id` 的同级标记
fn release_pointing_at<'a>(
    target_id: i64,
    peers: impl Iterator<Item = &'a PeerCandidate>,
) -> Vec<PeerUpdate> {
    peers
        .filter(|p| p.consolidated_into() == Some(target_id))
        .filter_map(|p| {
            let mut fields = p.fields.clone()?;
            fields.meta_mut().release();
            Some(PeerUpdate {
                submission_id: p.submission_id,
                fields,
            })
        })
        .collect()
}

fn same_kind(target: &ReportFields, peer: &ReportFields) -> bool {
    target.as_accomplishment().is_some() == peer.as_accomplishment().is_some()
}

/// 把选中的可解码同级提交标记为已汇总进 `target_id`
///
/// 与目标类型不同的提交（成果报告与表格互不相干）不会被标记
fn mark_included(
    target_id: i64,
    target: &ReportFields,
    chosen: &[&PeerCandidate],
    at: &str,
) -> (Vec<i64>, Vec<PeerUpdate>) {
    let mut included = Vec::with_capacity(chosen.len());
    let mut updates = Vec::with_capacity(chosen.len());
    for peer in chosen {
        let Some(fields) = peer.fields.as_ref().filter(|f| same_kind(target, f)) else {
            continue;
        };
        let mut fields = fields.clone();
        fields.meta_mut().mark_consolidated(target_id, at);
        included.push(peer.submission_id);
        updates.push(PeerUpdate {
            submission_id: peer.submission_id,
            fields,
        });
    }
    (included, updates)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::consolidation::PeerCandidate;
    use crate::models::submissions::{ReportFields, SubmissionStatus};
    use crate::models::users::UserRole;

    pub fn peer(id: i64, raw_fields: &str) -> PeerCandidate {
        PeerCandidate {
            submission_id: id,
            report_assignment_id: 1,
            submitted_by: 100 + id,
            submitter_name: format!("teacher-{id}"),
            submitter_role: UserRole::Teacher,
            status: SubmissionStatus::Submitted,
            value: "Flag Ceremony".to_string(),
            fields: ReportFields::decode_lenient(id, Some(raw_fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::peer;
    use super::*;

    #[test]
    fn test_stale_flags_cleared_for_empty_target() {
        let target = ReportFields::decode(Some(r#"{"meta":{"consolidatedImagesCount":0}}"#)).unwrap();
        let peers = vec![
            peer(10, r#"{"images":["a.jpg"],"meta":{"consolidatedInto":5}}"#),
            peer(11, r#"{"images":["b.jpg"],"meta":{"consolidatedInto":6}}"#),
        ];
        let updates = stale_flag_updates(5, &target, &peers);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].submission_id, 10);
        assert_eq!(updates[0].fields.meta().consolidated_into, None);
    }

    #[test]
    fn test_stale_flags_kept_when_target_has_images() {
        let target = ReportFields::decode(Some(r#"{"images":["a.jpg"]}"#)).unwrap();
        let peers = vec![peer(10, r#"{"images":["a.jpg"],"meta":{"consolidatedInto":5}}"#)];
        assert!(stale_flag_updates(5, &target, &peers).is_empty());
    }
}
