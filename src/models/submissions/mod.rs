pub mod entities;
pub mod fields;
pub mod requests;
pub mod responses;

pub use entities::{Submission, SubmissionStatus};
pub use fields::{AccomplishmentFields, ImageRef, ReportFields, TableRow};
