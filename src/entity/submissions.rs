//! 提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_assignment_id: i64,
    pub submitted_by: i64,
    pub status: i32,
    pub value: String,
    // JSON 文本，由 ReportFields 解码
    #[sea_orm(column_type = "Text", nullable)]
    pub fields: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_assignments::Entity",
        from = "Column::ReportAssignmentId",
        to = "super::report_assignments::Column::Id"
    )]
    ReportAssignment,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmittedBy",
        to = "super::users::Column::Id"
    )]
    Submitter,
}

impl Related<super::report_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportAssignment.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submitter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务模型
    ///
    /// `fields` 无法解码时退回空白载荷（记录警告），
    /// 需要严格校验的路径应直接对 `self.fields` 调用 `ReportFields::decode`
    pub fn into_submission(self) -> crate::models::submissions::entities::Submission {
        use crate::models::submissions::{ReportFields, Submission, SubmissionStatus};

        let fields = ReportFields::decode_lenient(self.id, self.fields.as_deref()).unwrap_or_default();
        Submission {
            id: self.id,
            report_assignment_id: self.report_assignment_id,
            submitted_by: self.submitted_by,
            status: SubmissionStatus::try_from(self.status).unwrap_or(SubmissionStatus::Draft),
            value: self.value,
            fields,
            created_at: super::unix_to_utc(self.created_at),
            updated_at: super::unix_to_utc(self.updated_at),
        }
    }
}
