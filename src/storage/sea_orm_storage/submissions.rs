//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::submissions::{Column, Entity as Submissions};
use crate::errors::{ReportError, Result};
use crate::models::submissions::{
    entities::{Submission, SubmissionStatus},
    fields::ReportFields,
    requests::{PatchSubmissionRequest, SubmissionListQuery},
    responses::SubmissionListResponse,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;

impl SeaOrmStorage {
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 分页列出提交
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let window = query.pagination.window();

        let mut select = Submissions::find();

        if let Some(assignment_id) = query.report_assignment_id {
            select = select.filter(Column::ReportAssignmentId.eq(assignment_id));
        }
        if let Some(submitted_by) = query.submitted_by {
            select = select.filter(Column::SubmittedBy.eq(submitted_by));
        }
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status));
        }

        select = select.order_by_desc(Column::UpdatedAt);

        let paginator = select.paginate(&self.db, window.size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ReportError::database_operation(format!("查询提交总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ReportError::database_operation(format!("查询提交页数失败: {e}")))?;
        let items = paginator
            .fetch_page(window.zero_based())
            .await
            .map_err(|e| ReportError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(SubmissionListResponse {
            items: items.into_iter().map(|m| m.into_submission()).collect(),
            pagination: window.describe(total, pages),
        })
    }

    /// 局部更新提交，返回更新前的状态和更新后的提交
    ///
    /// `fields` 与已有载荷浅合并后重新校验；已有载荷损坏时，补丁本身必须是完整载荷
    pub async fn patch_submission_impl(
        &self,
        id: i64,
        req: PatchSubmissionRequest,
    ) -> Result<Option<(SubmissionStatus, Submission)>> {
        let status = req.status.map(SubmissionStatus::try_from).transpose()?;
        let patch = match req.fields {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(ReportError::validation("fields 必须是 JSON 对象")),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ReportError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = Submissions::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询提交失败: {e}")))?
        else {
            return Ok(None);
        };

        let previous = SubmissionStatus::try_from(existing.status).unwrap_or(SubmissionStatus::Draft);

        let fields = match patch {
            None => None,
            Some(patch) => {
                let merged = match ReportFields::decode(existing.fields.as_deref()) {
                    Ok(current) => current.merge_patch(&patch)?,
                    Err(_) => ReportFields::from_value(Value::Object(patch))?,
                };
                Some(merged.encode()?)
            }
        };

        let mut model = existing.into_active_model();
        if let Some(status) = status {
            model.status = Set(status.code());
        }
        if let Some(value) = req.value {
            model.value = Set(value);
        }
        if let Some(fields) = fields {
            model.fields = Set(Some(fields));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| ReportError::database_operation(format!("更新提交失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ReportError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some((previous, updated.into_submission())))
    }

    pub async fn delete_submission_impl(&self, id: i64) -> Result<bool> {
        let result = Submissions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("删除提交失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
