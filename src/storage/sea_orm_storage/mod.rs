//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod categories;
mod consolidation;
mod notifications;
mod report_assignments;
mod submissions;
mod users;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::errors::{ReportError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| ReportError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("Database ready ({:?})", db.get_database_backend());

        Ok(Self { db })
    }

    /// 使用已建立的连接（调用方负责迁移）
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ReportError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| ReportError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| ReportError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 带 scheme 的 URL 原样使用；裸文件路径与 `:memory:` 视为 SQLite
    fn build_database_url(url: &str) -> Result<String> {
        const SERVER_SCHEMES: [&str; 5] =
            ["sqlite://", "postgres://", "postgresql://", "mysql://", "mariadb://"];

        if SERVER_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Ok(url.to_string());
        }
        let is_sqlite_file = [".db", ".sqlite"].iter().any(|ext| url.ends_with(ext));
        if is_sqlite_file || url == ":memory:" {
            return Ok(format!("sqlite://{url}?mode=rwc"));
        }
        Err(ReportError::database_config(format!(
            "无法识别的数据库 URL: {url}（支持 sqlite:// postgres:// mysql:// 或 .db/.sqlite 路径）"
        )))
    }
}

// Storage trait 实现
use crate::consolidation::{AccomplishmentPlan, TablePlan};
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 分类模块
    async fn create_category(&self, name: &str) -> Result<Category> {
        self.create_category_impl(name).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list_categories_impl().await
    }

    async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        self.get_category_by_id_impl(id).await
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        self.delete_category_impl(id).await
    }

    async fn create_sub_category(&self, category_id: i64, name: &str) -> Result<SubCategory> {
        self.create_sub_category_impl(category_id, name).await
    }

    async fn list_sub_categories(&self, category_id: i64) -> Result<Vec<SubCategory>> {
        self.list_sub_categories_impl(category_id).await
    }

    // 报告任务模块
    async fn create_report_assignment(
        &self,
        given_by: i64,
        req: CreateReportAssignmentRequest,
    ) -> Result<CreateReportAssignmentResponse> {
        self.create_report_assignment_impl(given_by, req).await
    }

    async fn get_report_assignment_by_id(&self, id: i64) -> Result<Option<ReportAssignment>> {
        self.get_report_assignment_by_id_impl(id).await
    }

    async fn list_report_assignments(
        &self,
        query: ReportAssignmentListParams,
    ) -> Result<ReportAssignmentListResponse> {
        self.list_report_assignments_impl(query).await
    }

    async fn delete_report_assignment(&self, id: i64) -> Result<bool> {
        self.delete_report_assignment_impl(id).await
    }

    async fn get_assignment_status_counts(&self, id: i64) -> Result<AssignmentStatusCounts> {
        self.get_assignment_status_counts_impl(id).await
    }

    // 提交模块
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    async fn patch_submission(
        &self,
        id: i64,
        req: PatchSubmissionRequest,
    ) -> Result<Option<(SubmissionStatus, Submission)>> {
        self.patch_submission_impl(id, req).await
    }

    async fn delete_submission(&self, id: i64) -> Result<bool> {
        self.delete_submission_impl(id).await
    }

    // 汇总模块
    async fn list_peer_candidates(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<Vec<PeerCandidate>> {
        self.list_peer_candidates_impl(target_id, filter).await
    }

    async fn clear_stale_consolidation_flags(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<usize> {
        self.clear_stale_consolidation_flags_impl(target_id, filter)
            .await
    }

    async fn consolidate_accomplishment(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<AccomplishmentPlan> {
        self.consolidate_accomplishment_impl(target_id, input).await
    }

    async fn release_accomplishment(
        &self,
        target_id: i64,
        filter: PeerFilter,
    ) -> Result<AccomplishmentPlan> {
        self.release_accomplishment_impl(target_id, filter).await
    }

    async fn consolidate_table(
        &self,
        target_id: i64,
        input: ConsolidationInput,
    ) -> Result<TablePlan> {
        self.consolidate_table_impl(target_id, input).await
    }

    // 通知模块
    async fn create_notification(&self, req: CreateNotificationRequest) -> Result<Notification> {
        self.create_notification_impl(req).await
    }

    async fn list_notifications_with_pagination(
        &self,
        user_id: i64,
        query: NotificationListQuery,
    ) -> Result<NotificationListResponse> {
        self.list_notifications_with_pagination_impl(user_id, query)
            .await
    }

    async fn get_unread_notification_count(&self, user_id: i64) -> Result<i64> {
        self.get_unread_notification_count_impl(user_id).await
    }

    async fn mark_notification_as_read(&self, user_id: i64, id: i64) -> Result<bool> {
        self.mark_notification_as_read_impl(user_id, id).await
    }

    async fn mark_all_notifications_as_read(&self, user_id: i64) -> Result<i64> {
        self.mark_all_notifications_as_read_impl(user_id).await
    }
}
