use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::images::{ImageSet, key_set};
use super::selection::{Selection, require_title};
use super::{AccomplishmentPlan, PeerUpdate, mark_included, release_pointing_at};
use crate::errors::{ReportError, Result};
use crate::models::consolidation::{PeerCandidate, TitleFallback};
use crate::models::submissions::{AccomplishmentFields, ImageRef, ReportFields};

fn peer_images(peer: &PeerCandidate) -> &[ImageRef] {
    peer.fields
        .as_ref()
        .and_then(ReportFields::as_accomplishment)
        .map(AccomplishmentFields::peer_images)
        .unwrap_or(&[])
}

fn target_accomplishment(target: &mut ReportFields) -> Result<&mut AccomplishmentFields> {
    target
        .as_accomplishment_mut()
        .ok_or_else(|| ReportError::validation("目标提交不是成果报告"))
}

/// 首次记录目标自有图片
///
/// 旧数据里目标可能已被汇总过却没有 ownImageKeys，
/// 此时仍指向目标的同级提交所提供的图片不算自有
fn first_own_keys(target_id: i64, existing: &[ImageRef], peers: &[PeerCandidate]) -> Vec<String> {
    let merged_earlier = key_set(
        peers
            .iter()
            .filter(|p| p.consolidated_into() == Some(target_id))
            .flat_map(|p| peer_images(p)),
    );
    ImageSet::from_images(existing)
        .keys()
        .into_iter()
        .filter(|k| !merged_earlier.contains(k))
        .collect()
}

/// 把选中的同级提交图片汇总进目标提交
///
/// 显式选择模式下，之前汇总进目标但本轮未选中的同级提交会被释放，
/// 仅由它们提供的图片从目标中移除；目标自有图片和仍被选中提交提供的图片保留。
pub fn consolidate_accomplishment(
    target_id: i64,
    target: &ReportFields,
    title: &str,
    peers: &[PeerCandidate],
    selected_ids: Option<&[i64]>,
    fallback: TitleFallback,
    now: DateTime<Utc>,
) -> Result<AccomplishmentPlan> {
    let title = require_title(title)?;
    let mut target_fields = target.clone();
    let target_acc = target_accomplishment(&mut target_fields)?;
    let at = now.to_rfc3339();

    let selection = Selection::new(title, selected_ids, fallback);
    let chosen = selection.pick(peers);

    let existing = target_acc.current_images().to_vec();
    if target_acc.meta.own_image_keys.is_none() {
        target_acc.meta.own_image_keys = Some(first_own_keys(target_id, &existing, peers));
    }
    let own_keys: HashSet<String> = target_acc
        .meta
        .own_image_keys
        .iter()
        .flatten()
        .cloned()
        .collect();

    let mut retained = existing;
    let mut released = Vec::new();
    let mut peer_updates: Vec<PeerUpdate> = Vec::new();

    if selection.is_explicit() {
        let chosen_ids: HashSet<i64> = chosen.iter().map(|p| p.submission_id).collect();
        let dropped: Vec<&PeerCandidate> = peers
            .iter()
            .filter(|p| {
                p.consolidated_into() == Some(target_id) && !chosen_ids.contains(&p.submission_id)
            })
            .collect();

        let kept_keys = key_set(chosen.iter().flat_map(|p| peer_images(p)));
        let removed_keys: HashSet<String> = key_set(dropped.iter().flat_map(|p| peer_images(p)))
            .into_iter()
            .filter(|k| !kept_keys.contains(k) && !own_keys.contains(k))
            .collect();
        retained.retain(|image| !removed_keys.contains(&image.dedup_key()));

        let releases = release_pointing_at(target_id, dropped.into_iter());
        released.extend(releases.iter().map(|u| u.submission_id));
        peer_updates.extend(releases);
    }

    let mut merged = ImageSet::from_images(&retained);
    for peer in &chosen {
        merged.extend(peer_images(peer));
    }

    let (included, marks) = mark_included(target_id, target, &chosen, &at);
    peer_updates.extend(marks);

    let images = merged.into_vec();
    target_acc.images = Some(images.clone());
    target_acc.meta.consolidated_at = Some(at);
    target_acc.meta.consolidated_images_count = Some(images.len() as i64);
    target_acc.meta.consolidated_from = included.clone();

    Ok(AccomplishmentPlan {
        target_fields,
        images,
        included,
        released,
        peer_updates,
    })
}

/// 撤销目标提交的全部汇总
///
/// 释放所有指向目标的同级提交；记录过自有图片时把目标图片裁回自有部分
pub fn release_accomplishment(
    target_id: i64,
    target: &ReportFields,
    peers: &[PeerCandidate],
) -> Result<AccomplishmentPlan> {
    let mut target_fields = target.clone();
    let target_acc = target_accomplishment(&mut target_fields)?;

    let peer_updates = release_pointing_at(target_id, peers.iter());
    let released = peer_updates.iter().map(|u| u.submission_id).collect();

    if let Some(own_keys) = target_acc.meta.own_image_keys.take() {
        let own_keys: HashSet<String> = own_keys.into_iter().collect();
        let own_images: Vec<ImageRef> = target_acc
            .current_images()
            .iter()
            .filter(|image| own_keys.contains(&image.dedup_key()))
            .cloned()
            .collect();
        target_acc.images = Some(own_images);
    }
    target_acc.meta.consolidated_at = None;
    target_acc.meta.consolidated_images_count = None;
    target_acc.meta.consolidated_from.clear();

    let images = target_acc.current_images().to_vec();
    Ok(AccomplishmentPlan {
        target_fields,
        images,
        included: Vec::new(),
        released,
        peer_updates,
    })
}
