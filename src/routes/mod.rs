pub mod auth;
pub mod categories;
pub mod notifications;
pub mod report_assignments;
pub mod reports;
pub mod submissions;
pub mod system;
pub mod users;

pub use auth::configure_auth_routes;
pub use categories::configure_category_routes;
pub use notifications::configure_notification_routes;
pub use report_assignments::configure_report_assignment_routes;
pub use reports::configure_report_routes;
pub use submissions::configure_submission_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;
