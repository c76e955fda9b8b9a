use std::sync::Arc;

use crate::consolidation::{AccomplishmentPlan, TablePlan};
use crate::errors::Result;
use crate::models::{
    categories::entities::{Category, SubCategory},
    consolidation::{ConsolidationInput, PeerCandidate, PeerFilter},
    notifications::{
        entities::Notification,
        requests::{CreateNotificationRequest, NotificationListQuery},
        responses::NotificationListResponse,
    },
    report_assignments::{
        entities::ReportAssignment,
        requests::{CreateReportAssignmentRequest, ReportAssignmentListParams},
        responses::{
            AssignmentStatusCounts, CreateReportAssignmentResponse, ReportAssignmentListResponse,
        },
    },
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::{PatchSubmissionRequest, SubmissionListQuery},
        responses::SubmissionListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 分类管理方法
    async fn create_category(&self, name: &str) -> Result<Category>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>>;
    async fn delete_category(&self, id: i64) -> Result<bool>;
    async fn create_sub_category(&self, category_id: i64, name: &str) -> Result<SubCategory>;
    async fn list_sub_categories(&self, category_id: i64) -> Result<Vec<SubCategory>>;

    /// 报告任务管理方法
    // 创建任务并为接收人生成空白提交（单事务）
    async fn create_report_assignment(
        &self,
        given_by: i64,
        req: CreateReportAssignmentRequest,
    ) -> Result<CreateReportAssignmentResponse>;
    async fn get_report_assignment_by_id(&self, id: i64) -> Result<Option<ReportAssignment>>;
    async fn list_report_assignments(
        &self,
        query: ReportAssignmentListParams,
    ) -> Result<ReportAssignmentListResponse>;
    async fn delete_report_assignment(&self, id: i64) -> Result<bool>;
    // 各状态提交数量
    async fn get_assignment_status_counts(&self, id: i64) -> Result<AssignmentStatusCounts>;

    /// 提交管理方法
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    // 局部更新，返回更新前状态和更新后的提交
    async fn patch_submission(
        &self,
        id: i64,
        req: PatchSubmissionRequest,
    ) -> Result<Option<(SubmissionStatus, Submission)>>;
    async fn delete_submission(&self, id: i64) -> Result<bool>;

    /// 汇总方法
    // 查找候选同级提交
    async fn list_peer_candidates(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<Vec<PeerCandidate>>;
    // 清除指向空目标的陈旧标记
    async fn clear_stale_consolidation_flags(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<usize>;
    // 汇总成果报告（单事务，锁定目标行）
    async fn consolidate_accomplishment(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<AccomplishmentPlan>;
    // 撤销全部汇总
    async fn release_accomplishment(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<AccomplishmentPlan>;
    // 汇总表格报告
    async fn consolidate_table(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<TablePlan>;

    /// 通知管理方法
    async fn create_notification(&self, req: CreateNotificationRequest) -> Result<Notification>;
    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<NotificationListResponse>;
    async fn get_unread_notification_count(&self, user_id: i64) -> Result<i64>;
    /// 通知不存在或不属于该用户时返回 false
    async fn mark_notification_as_read(&self, user_id: i64, id: i64) -> Result<bool>;
    async fn mark_all_notifications_as_read(&self, user_id: i64) -> Result<i64>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
