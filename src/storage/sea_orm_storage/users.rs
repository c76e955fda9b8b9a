use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{ReportError, Result};
use crate::models::users::{
    entities::User,
    requests::{CreateUserRequest, UserListQuery},
    responses::UserListResponse,
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// 用户名、邮箱、显示名任一包含关键字即命中；空白关键字不过滤
fn search_condition(search: Option<&str>) -> Option<Condition> {
    let term = search.map(str::trim).filter(|t| !t.is_empty())?;
    let pattern = format!("%{}%", escape_like_pattern(term));
    let like = || LikeExpr::new(pattern.clone()).escape('\\');
    Some(
        Condition::any()
            .add(Column::Username.like(like()))
            .add(Column::Email.like(like()))
            .add(Column::ProfileName.like(like())),
    )
}

impl SeaOrmStorage {
    /// `req.password` 须为已哈希的密码
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        ActiveModel::active_account(req, chrono::Utc::now().timestamp())
            .insert(&self.db)
            .await
            .map(|m| m.into_user())
            .map_err(|e| ReportError::database_operation(format!("创建用户失败: {e}")))
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        Users::find_by_id(id)
            .one(&self.db)
            .await
            .map(|found| found.map(|m| m.into_user()))
            .map_err(|e| ReportError::database_operation(format!("查询用户失败: {e}")))
    }

    /// 登录标识既可以是用户名也可以是邮箱
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        Users::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map(|found| found.map(|m| m.into_user()))
            .map_err(|e| ReportError::database_operation(format!("查询用户失败: {e}")))
    }

    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let window = query.pagination.window();

        let mut select = Users::find();
        if let Some(condition) = search_condition(query.search.as_deref()) {
            select = select.filter(condition);
        }
        if let Some(role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, window.size);
        let counts = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| ReportError::database_operation(format!("统计用户数量失败: {e}")))?;
        let rows = paginator
            .fetch_page(window.zero_based())
            .await
            .map_err(|e| ReportError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: rows.into_iter().map(|m| m.into_user()).collect(),
            pagination: window.describe(counts.number_of_items, counts.number_of_pages),
        })
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map(|r| r.rows_affected > 0)
            .map_err(|e| ReportError::database_operation(format!("更新最后登录时间失败: {e}")))
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("统计用户数量失败: {e}")))
    }
}
