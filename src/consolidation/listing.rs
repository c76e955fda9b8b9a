//! 同级提交列表的展示形态

use super::images::ImageSet;
use super::selection::normalize_title;
use crate::models::consolidation::PeerCandidate;
use crate::models::consolidation::responses::{
    PeerGroup, PeerSubmission, SummarySource, TablePeerSubmission,
};
use crate::models::submissions::{ImageRef, ReportFields, TableRow};

fn images_of(peer: &PeerCandidate) -> &[ImageRef] {
    peer.fields
        .as_ref()
        .and_then(ReportFields::as_accomplishment)
        .map(|f| f.peer_images())
        .unwrap_or(&[])
}

fn narrative_of(peer: &PeerCandidate) -> Option<String> {
    peer.fields
        .as_ref()
        .and_then(ReportFields::as_accomplishment)
        .and_then(|f| f.narrative())
        .map(str::to_string)
}

/// 按规范化标题分组，分组和组内顺序都按候选首次出现
pub fn group_by_title(peers: &[PeerCandidate]) -> Vec<PeerGroup> {
    let mut groups: Vec<(String, PeerGroup, ImageSet)> = Vec::new();

    for peer in peers {
        let key = normalize_title(peer.title());
        let index = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((
                    key,
                    PeerGroup {
                        title: peer.title().trim().to_string(),
                        images: Vec::new(),
                        submissions: Vec::new(),
                    },
                    ImageSet::new(),
                ));
                groups.len() - 1
            }
        };

        let (_, group, images) = &mut groups[index];
        let peer_images = images_of(peer);
        images.extend(peer_images);
        group.submissions.push(PeerSubmission {
            submission_id: peer.submission_id,
            report_assignment_id: peer.report_assignment_id,
            teacher_name: peer.submitter_name.clone(),
            title: peer.title().to_string(),
            images: peer_images.to_vec(),
            narrative: narrative_of(peer),
            fields: peer.fields.as_ref().map(ReportFields::to_value),
            consolidated_into: peer.consolidated_into(),
        });
    }

    groups
        .into_iter()
        .map(|(_, mut group, images)| {
            group.images = images.keys();
            group
        })
        .collect()
}

/// 叙述汇总素材
pub fn summary_sources(peers: &[PeerCandidate]) -> Vec<SummarySource> {
    peers
        .iter()
        .map(|peer| SummarySource {
            submission_id: peer.submission_id,
            teacher_name: peer.submitter_name.clone(),
            title: peer.title().to_string(),
            narrative: narrative_of(peer),
            consolidated_into: peer.consolidated_into(),
        })
        .collect()
}

pub fn table_peers(peers: &[PeerCandidate]) -> Vec<TablePeerSubmission> {
    peers
        .iter()
        .map(|peer| TablePeerSubmission {
            submission_id: peer.submission_id,
            report_assignment_id: peer.report_assignment_id,
            teacher_name: peer.submitter_name.clone(),
            title: peer.title().to_string(),
            rows: peer
                .fields
                .as_ref()
                .and_then(ReportFields::as_table)
                .map(|t| t.rows.clone())
                .unwrap_or_else(Vec::<TableRow>::new),
            consolidated_into: peer.consolidated_into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::test_support::peer;

    #[test]
    fn test_group_by_title() {
        let peers = vec![
            peer(10, r#"{"title":"Flag Ceremony","images":["a.jpg"]}"#),
            peer(11, r#"{"title":"Tree Planting","images":["t.jpg"]}"#),
            peer(12, r#"{"_answers":{"title":"flag  ceremony"},"images":["a.jpg","b.jpg"]}"#),
        ];
        let groups = group_by_title(&peers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Flag Ceremony");
        assert_eq!(groups[0].images, vec!["a.jpg", "b.jpg"]);
        let ids: Vec<i64> = groups[0].submissions.iter().map(|s| s.submission_id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert_eq!(groups[1].submissions[0].teacher_name, "teacher-11");
    }

    #[test]
    fn test_undecodable_peer_listed_without_payload() {
        let peers = vec![peer(10, "{invalid json")];
        let groups = group_by_title(&peers);
        let item = &groups[0].submissions[0];
        assert!(item.images.is_empty());
        assert!(item.fields.is_none());
        assert_eq!(item.title, "Flag Ceremony");
    }

    #[test]
    fn test_summary_sources_use_answers_narrative() {
        let peers = vec![peer(10, r#"{"_answers":{"narrative":"Held at 7am"},"narrative":"x"}"#)];
        let sources = summary_sources(&peers);
        assert_eq!(sources[0].narrative.as_deref(), Some("Held at 7am"));
    }
}
