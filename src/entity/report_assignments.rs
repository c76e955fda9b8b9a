//! 报告任务实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "report_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub coordinator_id: Option<i64>,
    pub report_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub instruction: Option<String>,
    pub deadline: Option<i64>,
    pub given_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::GivenBy",
        to = "super::users::Column::Id"
    )]
    GivenBy,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GivenBy.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_report_assignment(self) -> crate::models::report_assignments::entities::ReportAssignment {
        use crate::models::report_assignments::entities::{ReportAssignment, ReportType};
        use chrono::{DateTime, Utc};

        ReportAssignment {
            id: self.id,
            category_id: self.category_id,
            sub_category_id: self.sub_category_id,
            parent_report_assignment_id: self.parent_report_assignment_id,
            coordinator_id: self.coordinator_id,
            report_type: self
                .report_type
                .parse::<ReportType>()
                .unwrap_or(ReportType::Accomplishment),
            title: self.title,
            instruction: self.instruction,
            deadline: self
                .deadline
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            given_by: self.given_by,
            created_at: super::unix_to_utc(self.created_at),
            updated_at: super::unix_to_utc(self.updated_at),
        }
    }
}
