use crate::errors::{ReportError, Result};
use crate::models::consolidation::{PeerCandidate, TitleFallback};

/// 标题规范化：去首尾空白、合并连续空白、转小写
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 汇总必须提供非空标题
pub fn require_title(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ReportError::validation("汇总标题不能为空"));
    }
    Ok(trimmed)
}

/// 候选同级提交的选择方式
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// 客户端显式勾选的提交
    Explicit(&'a [i64]),
    /// 按规范化标题匹配
    TitleMatch {
        title: String,
        fallback: TitleFallback,
    },
}

impl<'a> Selection<'a> {
    /// `selected_ids` 非空时为显式选择
    pub fn new(title: &str, selected_ids: Option<&'a [i64]>, fallback: TitleFallback) -> Self {
        match selected_ids {
            Some(ids) if !ids.is_empty() => Selection::Explicit(ids),
            _ => Selection::TitleMatch {
                title: normalize_title(title),
                fallback,
            },
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Selection::Explicit(_))
    }

    /// 按候选顺序返回选中的提交
    pub fn pick<'p>(&self, peers: &'p [PeerCandidate]) -> Vec<&'p PeerCandidate> {
        match self {
            Selection::Explicit(ids) => peers
                .iter()
                .filter(|p| ids.contains(&p.submission_id))
                .collect(),
            Selection::TitleMatch { title, fallback } => {
                let matched: Vec<_> = peers
                    .iter()
                    .filter(|p| normalize_title(p.title()) == *title)
                    .collect();
                if matched.is_empty() && *fallback == TitleFallback::MergeAll {
                    peers.iter().collect()
                } else {
                    matched
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::test_support::peer;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Flag   Ceremony \n"), "flag ceremony");
        assert_eq!(normalize_title("FLAG CEREMONY"), "flag ceremony");
    }

    #[test]
    fn test_require_title() {
        assert!(require_title("   ").is_err());
        assert_eq!(require_title(" Flag Ceremony ").unwrap(), "Flag Ceremony");
    }

    #[test]
    fn test_explicit_keeps_candidate_order() {
        let peers = vec![peer(10, "{}"), peer(11, "{}"), peer(12, "{}")];
        let ids = [12, 10, 99];
        let selection = Selection::new("x", Some(&ids[..]), TitleFallback::MergeAll);
        assert!(selection.is_explicit());
        let picked: Vec<i64> = selection.pick(&peers).iter().map(|p| p.submission_id).collect();
        assert_eq!(picked, vec![10, 12]);
    }

    #[test]
    fn test_empty_ids_fall_back_to_title_match() {
        let selection = Selection::new("x", Some(&[][..]), TitleFallback::Strict);
        assert!(!selection.is_explicit());
    }

    #[test]
    fn test_title_match_uses_answers_title() {
        let peers = vec![
            peer(10, r#"{"_answers":{"title":"Brigada  Eskwela"}}"#),
            peer(11, r#"{"title":"Other"}"#),
            peer(12, "{}"),
        ];
        let selection = Selection::new("brigada eskwela", None, TitleFallback::MergeAll);
        let picked: Vec<i64> = selection.pick(&peers).iter().map(|p| p.submission_id).collect();
        assert_eq!(picked, vec![10]);
    }

    #[test]
    fn test_fallback_policies() {
        let peers = vec![peer(10, r#"{"title":"A"}"#), peer(11, r#"{"title":"B"}"#)];

        let merge_all = Selection::new("C", None, TitleFallback::MergeAll);
        assert_eq!(merge_all.pick(&peers).len(), 2);

        let strict = Selection::new("C", None, TitleFallback::Strict);
        assert!(strict.pick(&peers).is_empty());
    }
}
