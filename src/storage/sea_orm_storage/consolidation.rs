//! 同级提交查找与汇总写回
//!
//! 汇总在单个事务内完成：锁定目标行，在同一事务上查找候选，
//! 计算计划后写回同级提交与目标提交，最后提交事务；任一步出错即回滚。

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::consolidation::{
    self, AccomplishmentPlan, PeerUpdate, PeerVisibility, TablePlan, is_offered,
};
use crate::entity::report_assignments::{
    Column as AssignmentColumn, Entity as ReportAssignments,
};
use crate::entity::submissions::{Column, Entity as Submissions, Model as SubmissionModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{ReportError, Result};
use crate::models::consolidation::{ConsolidationInput, PeerCandidate, PeerFilter, PeerScope};
use crate::models::submissions::{ReportFields, SubmissionStatus};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::{debug, info};

impl SeaOrmStorage {
    /// 查找候选同级提交（已按可见性和汇总状态过滤）
    pub async fn list_peer_candidates_impl(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<Vec<PeerCandidate>> {
        let target = Submissions::find_by_id(target_id)
            .one(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询目标提交失败: {e}")))?
            .ok_or_else(|| ReportError::not_found(format!("提交 {target_id} 不存在")))?;

        Self::find_peer_candidates(&self.db, &target, &filter).await
    }

    /// 目标没有任何已汇总内容时，清除仍指向它的同级标记，返回清除数量
    pub async fn clear_stale_consolidation_flags_impl(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<usize> {
        let txn = self.begin_txn().await?;
        let target = Self::lock_target(&txn, target_id).await?;
        let Some(target_fields) =
            ReportFields::decode_lenient(target.id, target.fields.as_deref())
        else {
            return Ok(0);
        };

        let filter = PeerFilter {
            include_consolidated: true,
            ..filter
        };
        let peers = Self::find_peer_candidates(&txn, &target, &filter).await?;
        let updates = consolidation::stale_flag_updates(target_id, &target_fields, &peers);
        let cleared = updates.len();
        Self::write_peer_updates(&txn, &updates).await?;

        Self::commit_txn(txn).await?;
        if cleared > 0 {
            info!(
                "Cleared {} stale consolidation flags pointing at submission {}",
                cleared, target_id
            );
        }
        Ok(cleared)
    }

    /// 汇总成果报告图片
    pub async fn consolidate_accomplishment_impl(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<AccomplishmentPlan> {
        let txn = self.begin_txn().await?;
        let target = Self::lock_target(&txn, target_id).await?;
        let target_fields = ReportFields::decode(target.fields.as_deref())?;
        let peers = Self::find_peer_candidates(&txn, &target, &input.filter).await?;

        let plan = consolidation::consolidate_accomplishment(
            target_id,
            &target_fields,
            &input.title,
            &peers,
            input.selected_ids.as_deref(),
            input.fallback,
            chrono::Utc::now(),
        )?;

        Self::write_peer_updates(&txn, &plan.peer_updates).await?;
        Self::write_fields(&txn, target_id, &plan.target_fields).await?;
        Self::commit_txn(txn).await?;

        info!(
            "Consolidated {} peers into submission {} ({} images, {} released)",
            plan.included.len(),
            target_id,
            plan.images.len(),
            plan.released.len()
        );
        Ok(plan)
    }

    /// 撤销成果报告的全部汇总
    pub async fn release_accomplishment_impl(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<AccomplishmentPlan> {
        let txn = self.begin_txn().await?;
        let target = Self::lock_target(&txn, target_id).await?;
        let target_fields = ReportFields::decode(target.fields.as_deref())?;
        let filter = PeerFilter {
            include_consolidated: true,
            ..filter
        };
        let peers = Self::find_peer_candidates(&txn, &target, &filter).await?;

        let plan = consolidation::release_accomplishment(target_id, &target_fields, &peers)?;

        Self::write_peer_updates(&txn, &plan.peer_updates).await?;
        Self::write_fields(&txn, target_id, &plan.target_fields).await?;
        Self::commit_txn(txn).await?;

        info!(
            "Released {} peers from submission {}",
            plan.released.len(),
            target_id
        );
        Ok(plan)
    }

    /// 汇总 LAEMPL / MPS 表格
    pub async fn consolidate_table_impl(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<TablePlan> {
        let txn = self.begin_txn().await?;
        let target = Self::lock_target(&txn, target_id).await?;
        let target_fields = ReportFields::decode(target.fields.as_deref())?;
        let peers = Self::find_peer_candidates(&txn, &target, &input.filter).await?;

        let plan = consolidation::consolidate_table(
            target_id,
            &target_fields,
            &input.title,
            &peers,
            input.selected_ids.as_deref(),
            input.fallback,
            chrono::Utc::now(),
        )?;

        Self::write_peer_updates(&txn, &plan.peer_updates).await?;
        Self::write_fields(&txn, target_id, &plan.target_fields).await?;
        Self::commit_txn(txn).await?;

        info!(
            "Consolidated {} table peers into submission {} ({} rows)",
            plan.included.len(),
            target_id,
            plan.rows.len()
        );
        Ok(plan)
    }

    async fn begin_txn(&self) -> Result<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| ReportError::database_operation(format!("开启事务失败: {e}")))
    }

    async fn commit_txn(txn: DatabaseTransaction) -> Result<()> {
        txn.commit()
            .await
            .map_err(|e| ReportError::database_operation(format!("提交事务失败: {e}")))
    }

    /// `SELECT ... FOR UPDATE` 锁定目标提交（SQLite 下由数据库级写锁代替）
    async fn lock_target(txn: &DatabaseTransaction, target_id: i64) -> Result<SubmissionModel> {
        Submissions::find_by_id(target_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("锁定目标提交失败: {e}")))?
            .ok_or_else(|| ReportError::not_found(format!("提交 {target_id} 不存在")))
    }

    async fn write_fields<C: ConnectionTrait>(
        conn: &C,
        submission_id: i64,
        fields: &ReportFields,
    ) -> Result<()> {
        let encoded = fields.encode()?;
        Submissions::update_many()
            .col_expr(Column::Fields, sea_orm::sea_query::Expr::value(encoded))
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(submission_id))
            .exec(conn)
            .await
            .map_err(|e| ReportError::database_operation(format!("写回提交载荷失败: {e}")))?;
        Ok(())
    }

    async fn write_peer_updates<C: ConnectionTrait>(
        conn: &C,
        updates: &[PeerUpdate],
    ) -> Result<()> {
        for update in updates {
            Self::write_fields(conn, update.submission_id, &update.fields).await?;
        }
        Ok(())
    }

    /// 解析查找范围对应的报告任务 ID
    async fn scope_assignment_ids<C: ConnectionTrait>(
        conn: &C,
        target: &SubmissionModel,
        scope: PeerScope,
    ) -> Result<Vec<i64>> {
        match scope {
            PeerScope::Assignment(id) => Ok(vec![id]),
            PeerScope::TargetAssignment => Ok(vec![target.report_assignment_id]),
            PeerScope::ParentAssignment(parent_id) => ReportAssignments::find()
                .select_only()
                .column(AssignmentColumn::Id)
                .filter(AssignmentColumn::ParentReportAssignmentId.eq(parent_id))
                .into_tuple::<i64>()
                .all(conn)
                .await
                .map_err(|e| ReportError::database_operation(format!("查询子任务失败: {e}"))),
        }
    }

    /// 成果报告协调员名单
    async fn accomplishment_coordinators<C: ConnectionTrait>(
        conn: &C,
        category_id: i64,
    ) -> Result<HashSet<i64>> {
        let ids = ReportAssignments::find()
            .select_only()
            .column(AssignmentColumn::CoordinatorId)
            .filter(AssignmentColumn::CategoryId.eq(category_id))
            .filter(AssignmentColumn::CoordinatorId.is_not_null())
            .into_tuple::<Option<i64>>()
            .all(conn)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询协调员失败: {e}")))?;

        Ok(ids.into_iter().flatten().collect())
    }

    pub(crate) async fn find_peer_candidates<C: ConnectionTrait>(
        conn: &C,
        target: &SubmissionModel,
        filter: &PeerFilter,
    ) -> Result<Vec<PeerCandidate>> {
        let assignment_ids = Self::scope_assignment_ids(conn, target, filter.scope).await?;
        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let submissions = Submissions::find()
            .filter(Column::ReportAssignmentId.is_in(assignment_ids))
            .filter(Column::Status.gte(SubmissionStatus::Submitted.code()))
            .filter(Column::Id.ne(target.id))
            .order_by_asc(Column::Id)
            .all(conn)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询同级提交失败: {e}")))?;

        let submitter_ids: Vec<i64> = submissions
            .iter()
            .map(|s| s.submitted_by)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users: HashMap<i64, _> = if submitter_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(UserColumn::Id.is_in(submitter_ids))
                .all(conn)
                .await
                .map_err(|e| ReportError::database_operation(format!("查询提交者失败: {e}")))?
                .into_iter()
                .map(|u| (u.id, u.into_user()))
                .collect()
        };

        let roster = if PeerVisibility::needs_coordinator_roster(&filter.requester_role) {
            Self::accomplishment_coordinators(conn, filter.accomplishment_category_id).await?
        } else {
            HashSet::new()
        };
        let visibility = PeerVisibility::new(filter.requester_role.clone(), roster);

        let candidates: Vec<PeerCandidate> = submissions
            .into_iter()
            .filter_map(|s| {
                let user = users.get(&s.submitted_by)?;
                if !visibility.admits(user.id, &user.role) {
                    return None;
                }
                Some(PeerCandidate {
                    submission_id: s.id,
                    report_assignment_id: s.report_assignment_id,
                    submitted_by: s.submitted_by,
                    submitter_name: user.display_name().to_string(),
                    submitter_role: user.role.clone(),
                    status: SubmissionStatus::try_from(s.status)
                        .unwrap_or(SubmissionStatus::Submitted),
                    fields: ReportFields::decode_lenient(s.id, s.fields.as_deref()),
                    value: s.value,
                })
            })
            .filter(|c| is_offered(c, target.id, filter.include_consolidated))
            .collect();

        debug!(
            "Found {} peer candidates for submission {} (requester role {})",
            candidates.len(),
            target.id,
            filter.requester_role
        );
        Ok(candidates)
    }
}
