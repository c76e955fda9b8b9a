use super::entities::Submission;
use crate::models::common::pagination::PaginatedResponse;

pub type SubmissionListResponse = PaginatedResponse<Submission>;
