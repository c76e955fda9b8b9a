//! 报告分类存储操作

use super::SeaOrmStorage;
use crate::entity::categories::{ActiveModel, Column, Entity as Categories};
use crate::entity::sub_categories::{
    ActiveModel as SubCategoryActiveModel, Column as SubCategoryColumn,
    Entity as SubCategories,
};
use crate::errors::{ReportError, Result};
use crate::models::categories::entities::{Category, SubCategory};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_category_impl(&self, name: &str) -> Result<Category> {
        let model = ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("创建分类失败: {e}")))?;

        Ok(result.into_category())
    }

    pub async fn list_categories_impl(&self) -> Result<Vec<Category>> {
        let result = Categories::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询分类列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_category()).collect())
    }

    pub async fn get_category_by_id_impl(&self, id: i64) -> Result<Option<Category>> {
        let result = Categories::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询分类失败: {e}")))?;

        Ok(result.map(|m| m.into_category()))
    }

    /// 删除分类及其子分类
    pub async fn delete_category_impl(&self, id: i64) -> Result<bool> {
        SubCategories::delete_many()
            .filter(SubCategoryColumn::CategoryId.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("删除子分类失败: {e}")))?;

        let result = Categories::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("删除分类失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn create_sub_category_impl(
        &self,
        category_id: i64,
        name: &str,
    ) -> Result<SubCategory> {
        let model = SubCategoryActiveModel {
            category_id: Set(category_id),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("创建子分类失败: {e}")))?;

        Ok(result.into_sub_category())
    }

    pub async fn list_sub_categories_impl(&self, category_id: i64) -> Result<Vec<SubCategory>> {
        let result = SubCategories::find()
            .filter(SubCategoryColumn::CategoryId.eq(category_id))
            .order_by_asc(SubCategoryColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| ReportError::database_operation(format!("查询子分类列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_sub_category()).collect())
    }
}
