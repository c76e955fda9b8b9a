use std::collections::HashSet;

use crate::models::consolidation::PeerCandidate;
use crate::models::users::UserRole;

/// 请求者能看到哪些人的提交
#[derive(Debug, Clone)]
pub struct PeerVisibility {
    requester: UserRole,
    /// 成果报告协调员，对其他协调员不可见
    accomplishment_coordinators: HashSet<i64>,
}

impl PeerVisibility {
    pub fn new(requester: UserRole, accomplishment_coordinators: HashSet<i64>) -> Self {
        Self {
            requester,
            accomplishment_coordinators,
        }
    }

    /// 是否需要查询成果报告协调员名单
    pub fn needs_coordinator_roster(requester: &UserRole) -> bool {
        *requester == UserRole::Coordinator
    }

    pub fn admits(&self, submitter_id: i64, submitter_role: &UserRole) -> bool {
        match (&self.requester, submitter_role) {
            (_, UserRole::Teacher) => true,
            (UserRole::Principal | UserRole::Admin, UserRole::Coordinator) => true,
            (UserRole::Coordinator, UserRole::Coordinator) => {
                !self.accomplishment_coordinators.contains(&submitter_id)
            }
            _ => false,
        }
    }
}

/// 候选是否应当出现在列表中
///
/// 已汇总进其他目标的提交只在 `include_consolidated` 时出现
pub fn is_offered(candidate: &PeerCandidate, target_id: i64, include_consolidated: bool) -> bool {
    include_consolidated
        || candidate
            .consolidated_into()
            .is_none_or(|into| into == target_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::test_support::peer;

    #[test]
    fn test_principal_sees_teachers_and_coordinators() {
        let v = PeerVisibility::new(UserRole::Principal, HashSet::new());
        assert!(v.admits(1, &UserRole::Teacher));
        assert!(v.admits(2, &UserRole::Coordinator));
        assert!(!v.admits(3, &UserRole::Principal));
    }

    #[test]
    fn test_coordinator_hides_accomplishment_coordinators() {
        let v = PeerVisibility::new(UserRole::Coordinator, HashSet::from([7]));
        assert!(v.admits(1, &UserRole::Teacher));
        assert!(v.admits(2, &UserRole::Coordinator));
        assert!(!v.admits(7, &UserRole::Coordinator));
        assert!(!v.admits(3, &UserRole::Admin));
    }

    #[test]
    fn test_teacher_sees_teachers_only() {
        let v = PeerVisibility::new(UserRole::Teacher, HashSet::new());
        assert!(v.admits(1, &UserRole::Teacher));
        assert!(!v.admits(2, &UserRole::Coordinator));
    }

    #[test]
    fn test_is_offered() {
        let free = peer(10, "{}");
        let mine = peer(11, r#"{"meta":{"consolidatedInto":1}}"#);
        let other = peer(12, r#"{"meta":{"consolidatedInto":2}}"#);
        let broken = peer(13, "{invalid json");

        assert!(is_offered(&free, 1, false));
        assert!(is_offered(&mine, 1, false));
        assert!(!is_offered(&other, 1, false));
        assert!(is_offered(&other, 1, true));
        assert!(is_offered(&broken, 1, false));
    }
}
