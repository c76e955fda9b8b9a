//! 报告任务存储操作

use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::notifications::ActiveModel as NotificationActiveModel;
use crate::entity::report_assignments::{ActiveModel, Column, Entity as ReportAssignments};
use crate::entity::submissions::{
    ActiveModel as SubmissionActiveModel, Column as SubmissionColumn, Entity as Submissions,
};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{ReportError, Result};
use crate::models::{
    notifications::{entities::NotificationType, requests::CreateNotificationRequest},
    report_assignments::{
        entities::ReportAssignment,
        requests::{CreateReportAssignmentRequest, ReportAssignmentListParams},
        responses::{
            AssignmentStatusCounts, CreateReportAssignmentResponse, ReportAssignmentListResponse,
        },
    },
    submissions::{ReportFields, SubmissionStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建报告任务，并在同一事务中为每个接收人生成空白提交和通知
    pub async fn create_report_assignment_impl(
        &self,
        given_by: i64,
        req: CreateReportAssignmentRequest,
    ) -> Result<CreateReportAssignmentResponse> {
        let now = chrono::Utc::now().timestamp();

        // 去重且保持顺序
        let mut seen = HashSet::new();
        let recipients: Vec<i64> = req
            .recipients
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let blank_fields = ReportFields::blank(req.report_type).encode()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ReportError::database_operation(format!("开启事务失败: {e}")))?;

        if !recipients.is_empty() {
            let found = Users::find()
                .filter(UserColumn::Id.is_in(recipients.clone()))
                .count(&txn)
                .await
                .map_err(|e| ReportError::database_operation(format!("查询接收人失败: {e}")))?;
            if found as usize != recipients.len() {
                return Err(ReportError::not_found("部分接收人不存在"));
            }
        }

        let assignment = ActiveModel {
            category_id: Set(req.category_id),
            sub_category_id: Set(req.sub_category_id),
            parent_report_assignment_id: Set(req.parent_report_assignment_id),
            coordinator_id: Set(req.coordinator_id),
            report_type: Set(req.report_type.to_string()),
            title: Set(req.title.clone()),
            instruction: Set(req.instruction),
            deadline: Set(req.deadline.map(|d| d.timestamp())),
            given_by: Set(given_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ReportError::database_operation(format!("创建报告任务失败: {e}")))?;

        let mut submission_ids = Vec::with_capacity(recipients.len());
        for recipient in &recipients {
            let submission = SubmissionActiveModel {
                report_assignment_id: Set(assignment.id),
                submitted_by: Set(*recipient),
                status: Set(SubmissionStatus::Draft.code()),
                value: Set(req.title.clone()),
                fields: Set(Some(blank_fields.clone())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("创建提交失败: {e}")))?;
            submission_ids.push(submission.id);

            NotificationActiveModel::unread(
                CreateNotificationRequest {
                    user_id: *recipient,
                    notification_type: NotificationType::ReportAssigned,
                    title: format!("新的报告任务: {}", req.title),
                    content: None,
                    reference_type: Some("report_assignment".to_string()),
                    reference_id: Some(assignment.id),
                },
                now,
            )
            .insert(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("创建通知失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| ReportError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(CreateReportAssignmentResponse {
            assignment: assignment.into_report_assignment(),
            submission_ids,
        })
    }

    pub async fn get_report_assignment_by_id_impl(
        &self,
        id: i64,
    ) -> Result<Option<ReportAssignment>> {
        let result = ReportAssignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询报告任务失败: {e}")))?;

        Ok(result.map(|m| m.into_report_assignment()))
    }

    /// 分页列出报告任务
    pub async fn list_report_assignments_impl(
        &self,
        query: ReportAssignmentListParams,
    ) -> Result<ReportAssignmentListResponse> {
        let window = query.pagination.window();

        let mut select = ReportAssignments::find();

        if let Some(category_id) = query.category_id {
            select = select.filter(Column::CategoryId.eq(category_id));
        }
        if let Some(parent_id) = query.parent_report_assignment_id {
            select = select.filter(Column::ParentReportAssignmentId.eq(parent_id));
        }
        if let Some(given_by) = query.given_by {
            select = select.filter(Column::GivenBy.eq(given_by));
        }

        select = select.order_by_desc(Column::CreatedAt);

        let paginator = select.paginate(&self.db, window.size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ReportError::database_operation(format!("查询报告任务总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ReportError::database_operation(format!("查询报告任务页数失败: {e}")))?;
        let items = paginator
            .fetch_page(window.zero_based())
            .await
            .map_err(|e| ReportError::database_operation(format!("查询报告任务列表失败: {e}")))?;

        Ok(ReportAssignmentListResponse {
            items: items
                .into_iter()
                .map(|m| m.into_report_assignment())
                .collect(),
            pagination: window.describe(total, pages),
        })
    }

    /// 删除报告任务及其提交
    pub async fn delete_report_assignment_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ReportError::database_operation(format!("开启事务失败: {e}")))?;

        Submissions::delete_many()
            .filter(SubmissionColumn::ReportAssignmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("删除任务提交失败: {e}")))?;

        let result = ReportAssignments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("删除报告任务失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ReportError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计任务下各状态的提交数量
    pub async fn get_assignment_status_counts_impl(
        &self,
        id: i64,
    ) -> Result<AssignmentStatusCounts> {
        let rows: Vec<(i32, i64)> = Submissions::find()
            .select_only()
            .column(SubmissionColumn::Status)
            .column_as(SubmissionColumn::Id.count(), "count")
            .filter(SubmissionColumn::ReportAssignmentId.eq(id))
            .group_by(SubmissionColumn::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("统计提交状态失败: {e}")))?;

        let mut counts = AssignmentStatusCounts {
            report_assignment_id: id,
            ..Default::default()
        };
        for (status, count) in rows {
            counts.total += count;
            match SubmissionStatus::try_from(status) {
                Ok(SubmissionStatus::Draft) => counts.draft += count,
                Ok(SubmissionStatus::Pending) => counts.pending += count,
                Ok(SubmissionStatus::Submitted) => counts.submitted += count,
                Ok(SubmissionStatus::Approved) => counts.approved += count,
                Ok(SubmissionStatus::Rejected) => counts.rejected += count,
                Err(_) => {}
            }
        }

        Ok(counts)
    }
}
