//! 预导入模块，方便使用

pub use super::categories::{
    ActiveModel as CategoryActiveModel, Entity as Categories, Model as CategoryModel,
};
pub use super::notifications::{
    ActiveModel as NotificationActiveModel, Entity as Notifications, Model as NotificationModel,
};
pub use super::report_assignments::{
    ActiveModel as ReportAssignmentActiveModel, Entity as ReportAssignments,
    Model as ReportAssignmentModel,
};
pub use super::sub_categories::{
    ActiveModel as SubCategoryActiveModel, Entity as SubCategories, Model as SubCategoryModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
