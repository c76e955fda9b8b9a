use crate::models::{
    notifications::{entities::NotificationType, requests::CreateNotificationRequest},
    submissions::entities::{Submission, SubmissionStatus},
};

/// 状态变为退回或通过时，给提交人的通知
pub fn status_notification(
    previous: SubmissionStatus,
    submission: &Submission,
) -> Option<CreateNotificationRequest> {
    if previous == submission.status {
        return None;
    }
    let (notification_type, verb) = match submission.status {
        SubmissionStatus::Rejected => (NotificationType::SubmissionRejected, "returned"),
        SubmissionStatus::Approved => (NotificationType::SubmissionApproved, "approved"),
        _ => return None,
    };
    let title = if submission.value.trim().is_empty() {
        format!("Your submission was {verb}")
    } else {
        format!("Your submission \"{}\" was {verb}", submission.value.trim())
    };
    Some(CreateNotificationRequest {
        user_id: submission.submitted_by,
        notification_type,
        title,
        content: None,
        reference_type: Some("submission".to_string()),
        reference_id: Some(submission.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::ReportFields;

    fn submission(status: SubmissionStatus) -> Submission {
        Submission {
            id: 31,
            report_assignment_id: 4,
            submitted_by: 12,
            status,
            value: "Brigada Eskwela".to_string(),
            fields: ReportFields::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_rejection_notifies_submitter() {
        let n = status_notification(
            SubmissionStatus::Submitted,
            &submission(SubmissionStatus::Rejected),
        )
        .unwrap();
        assert_eq!(n.user_id, 12);
        assert_eq!(n.notification_type, NotificationType::SubmissionRejected);
        assert_eq!(n.reference_id, Some(31));
        assert!(n.title.contains("Brigada Eskwela"));
    }

    #[test]
    fn test_unchanged_or_other_status_is_silent() {
        assert!(
            status_notification(
                SubmissionStatus::Rejected,
                &submission(SubmissionStatus::Rejected)
            )
            .is_none()
        );
        assert!(
            status_notification(
                SubmissionStatus::Draft,
                &submission(SubmissionStatus::Submitted)
            )
            .is_none()
        );
    }
}
