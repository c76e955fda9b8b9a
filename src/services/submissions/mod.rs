pub mod notify;
pub mod patch;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::ReportError;
use crate::models::{
    ApiResponse, ErrorCode,
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::{PatchSubmissionRequest, SubmissionListQuery},
    },
    users::entities::{User, UserRole},
};

use super::{app_storage, current_user};

pub struct SubmissionService;

pub(crate) fn submission_not_found(id: i64) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::SubmissionNotFound,
        format!("Submission {id} not found"),
    ))
}

/// 教师只能操作自己的提交，审阅角色不受限
pub(crate) fn ensure_can_modify(user: &User, submission: &Submission) -> Result<(), ReportError> {
    if submission.submitted_by == user.id || is_reviewer(user) {
        Ok(())
    } else {
        Err(ReportError::authorization(format!(
            "User {} cannot modify submission {}",
            user.id, submission.id
        )))
    }
}

/// 审核结果（通过、退回）只能由审阅角色写入
pub(crate) fn ensure_can_set_status(user: &User, status: Option<i32>) -> Result<(), ReportError> {
    let review_codes = [
        SubmissionStatus::Approved.code(),
        SubmissionStatus::Rejected.code(),
    ];
    match status {
        Some(code) if review_codes.contains(&code) && !is_reviewer(user) => {
            Err(ReportError::authorization(format!(
                "Role {} cannot set submission status {}",
                user.role, code
            )))
        }
        _ => Ok(()),
    }
}

fn is_reviewer(user: &User) -> bool {
    UserRole::reviewer_roles().contains(&&user.role)
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn list_submissions(
        &self,
        params: SubmissionListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let response = app_storage(request)?
            .list_submissions_with_pagination(params)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Submissions retrieved successfully",
        )))
    }

    pub async fn get_submission(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match app_storage(request)?.get_submission_by_id(id).await? {
            Some(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                submission,
                "Submission retrieved successfully",
            ))),
            None => Ok(submission_not_found(id)),
        }
    }

    // 局部更新（浅合并 fields）
    pub async fn patch_submission(
        &self,
        id: i64,
        req: PatchSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        patch::patch_submission(id, req, request).await
    }

    pub async fn delete_submission(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        let storage = app_storage(request)?;
        let Some(submission) = storage.get_submission_by_id(id).await? else {
            return Ok(submission_not_found(id));
        };
        ensure_can_modify(&user, &submission)?;

        if storage.delete_submission(id).await? {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Submission deleted")))
        } else {
            Ok(submission_not_found(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::ReportFields;
    use crate::models::users::entities::{UserProfile, UserStatus};

    fn user(id: i64, role: UserRole) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@school.test"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            profile: UserProfile {
                profile_name: format!("User {id}"),
                avatar_url: None,
            },
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn own_submission(submitted_by: i64) -> Submission {
        Submission {
            id: 31,
            report_assignment_id: 4,
            submitted_by,
            status: SubmissionStatus::Submitted,
            value: "Brigada Eskwela".to_string(),
            fields: ReportFields::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_teacher_cannot_approve_or_reject() {
        let teacher = user(12, UserRole::Teacher);
        assert!(ensure_can_modify(&teacher, &own_submission(12)).is_ok());
        assert!(ensure_can_modify(&teacher, &own_submission(13)).is_err());

        assert!(ensure_can_set_status(&teacher, None).is_ok());
        assert!(ensure_can_set_status(&teacher, Some(SubmissionStatus::Submitted.code())).is_ok());
        let err = ensure_can_set_status(&teacher, Some(SubmissionStatus::Approved.code()))
            .unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::FORBIDDEN);
        assert!(ensure_can_set_status(&teacher, Some(SubmissionStatus::Rejected.code())).is_err());
    }

    #[test]
    fn test_reviewers_can_set_review_status() {
        for role in [UserRole::Coordinator, UserRole::Principal, UserRole::Admin] {
            let reviewer = user(2, role);
            assert!(ensure_can_set_status(&reviewer, Some(SubmissionStatus::Approved.code())).is_ok());
            assert!(ensure_can_set_status(&reviewer, Some(SubmissionStatus::Rejected.code())).is_ok());
            assert!(ensure_can_modify(&reviewer, &own_submission(12)).is_ok());
        }
    }
}
