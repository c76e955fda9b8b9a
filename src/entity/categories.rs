//! 报告分类实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sub_categories::Entity")]
    SubCategories,
}

impl Related<super::sub_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_category(self) -> crate::models::categories::entities::Category {

        crate::models::categories::entities::Category {
            id: self.id,
            name: self.name,
            created_at: super::unix_to_utc(self.created_at),
        }
    }
}
