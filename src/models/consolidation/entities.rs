use crate::models::submissions::{ReportFields, SubmissionStatus};
use crate::models::users::UserRole;

/// 同级提交的查找范围，三者互斥
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerScope {
    /// 同一报告任务下的提交
    Assignment(i64),
    /// 父任务下所有子任务的提交
    ParentAssignment(i64),
    /// 目标提交自身所在的任务
    TargetAssignment,
}

impl PeerScope {
    /// `ra` 优先于 `pra`，都没有时使用目标所在任务
    pub fn from_params(ra: Option<i64>, pra: Option<i64>) -> Self {
        match (ra, pra) {
            (Some(ra), _) => PeerScope::Assignment(ra),
            (None, Some(pra)) => PeerScope::ParentAssignment(pra),
            (None, None) => PeerScope::TargetAssignment,
        }
    }
}

/// 标题匹配为空时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleFallback {
    /// 没有任何标题匹配时合并全部候选
    MergeAll,
    /// 只合并标题匹配的候选
    Strict,
}

impl From<bool> for TitleFallback {
    fn from(merge_all: bool) -> Self {
        if merge_all {
            TitleFallback::MergeAll
        } else {
            TitleFallback::Strict
        }
    }
}

/// 同级提交查找条件
#[derive(Debug, Clone)]
pub struct PeerFilter {
    pub requester_role: UserRole,
    pub scope: PeerScope,
    pub include_consolidated: bool,
    /// 成果报告所属分类，用于识别“成果报告协调员”
    pub accomplishment_category_id: i64,
}

/// 一次汇总的输入
#[derive(Debug, Clone)]
pub struct ConsolidationInput {
    pub title: String,
    pub selected_ids: Option<Vec<i64>>,
    pub filter: PeerFilter,
    pub fallback: TitleFallback,
}

/// 候选同级提交
#[derive(Debug, Clone)]
pub struct PeerCandidate {
    pub submission_id: i64,
    pub report_assignment_id: i64,
    pub submitted_by: i64,
    pub submitter_name: String,
    pub submitter_role: UserRole,
    pub status: SubmissionStatus,
    pub value: String,
    /// 无法解码时为 `None`
    pub fields: Option<ReportFields>,
}

impl PeerCandidate {
    /// 候选标题：表单标题优先，其次提交标题
    pub fn title(&self) -> &str {
        self.fields
            .as_ref()
            .and_then(|f| f.title())
            .unwrap_or(&self.value)
    }

    pub fn consolidated_into(&self) -> Option<i64> {
        self.fields.as_ref().and_then(|f| f.meta().consolidated_into)
    }
}
