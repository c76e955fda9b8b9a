use sea_orm::{ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter};
use serde_json::json;

use super::SeaOrmStorage;
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::models::PaginationQuery;
use crate::models::consolidation::{ConsolidationInput, PeerFilter, PeerScope, TitleFallback};
use crate::models::notifications::requests::NotificationListQuery;
use crate::models::report_assignments::{
    entities::ReportType, requests::CreateReportAssignmentRequest,
};
use crate::models::submissions::{ImageRef, Submission, SubmissionStatus};
use crate::models::submissions::requests::PatchSubmissionRequest;
use crate::models::users::{User, UserProfile, UserRole, requests::CreateUserRequest};
use migration::{Migrator, MigratorTrait};

async fn setup() -> SeaOrmStorage {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    SeaOrmStorage::from_connection(db)
}

async fn user(storage: &SeaOrmStorage, name: &str, role: UserRole) -> User {
    storage
        .create_user_impl(CreateUserRequest {
            username: name.to_string(),
            email: format!("{name}@school.test"),
            password: "hash".to_string(),
            role,
            profile: UserProfile {
                profile_name: name.to_string(),
                avatar_url: None,
            },
        })
        .await
        .unwrap()
}

fn assignment_request(
    report_type: ReportType,
    recipients: Vec<i64>,
) -> CreateReportAssignmentRequest {
    CreateReportAssignmentRequest {
        category_id: 1,
        sub_category_id: None,
        parent_report_assignment_id: None,
        coordinator_id: None,
        report_type,
        title: "Flag Ceremony".to_string(),
        instruction: None,
        deadline: None,
        recipients,
    }
}

async fn submit(storage: &SeaOrmStorage, id: i64, fields: serde_json::Value) -> Submission {
    storage
        .patch_submission_impl(
            id,
            PatchSubmissionRequest {
                status: Some(SubmissionStatus::Submitted.code()),
                value: None,
                fields: Some(fields),
            },
        )
        .await
        .unwrap()
        .unwrap()
        .1
}

fn filter(role: UserRole, scope: PeerScope, include_consolidated: bool) -> PeerFilter {
    PeerFilter {
        requester_role: role,
        scope,
        include_consolidated,
        accomplishment_category_id: 0,
    }
}

fn input(selected_ids: Option<Vec<i64>>) -> ConsolidationInput {
    ConsolidationInput {
        title: "Flag Ceremony".to_string(),
        selected_ids,
        filter: filter(UserRole::Coordinator, PeerScope::TargetAssignment, false),
        fallback: TitleFallback::MergeAll,
    }
}

fn image_keys(submission: &Submission) -> Vec<String> {
    submission
        .fields
        .as_accomplishment()
        .unwrap()
        .current_images()
        .iter()
        .map(ImageRef::dedup_key)
        .collect()
}

/// 一个协调员和两位教师同属一个成果报告任务，教师均已提交
async fn flag_ceremony(storage: &SeaOrmStorage) -> (i64, i64, i64) {
    let coordinator = user(storage, "coord", UserRole::Coordinator).await;
    let t1 = user(storage, "teacher1", UserRole::Teacher).await;
    let t2 = user(storage, "teacher2", UserRole::Teacher).await;

    let created = storage
        .create_report_assignment_impl(
            coordinator.id,
            assignment_request(ReportType::Accomplishment, vec![coordinator.id, t1.id, t2.id]),
        )
        .await
        .unwrap();
    let ids = created.submission_ids;

    submit(storage, ids[1], json!({"images": ["a.jpg"]})).await;
    submit(storage, ids[2], json!({"images": ["a.jpg", "b.jpg"]})).await;
    (ids[0], ids[1], ids[2])
}

#[tokio::test]
async fn test_create_assignment_fans_out_blank_submissions() {
    let storage = setup().await;
    let principal = user(&storage, "principal", UserRole::Principal).await;
    let t1 = user(&storage, "teacher1", UserRole::Teacher).await;
    let t2 = user(&storage, "teacher2", UserRole::Teacher).await;

    let created = storage
        .create_report_assignment_impl(
            principal.id,
            assignment_request(ReportType::Laempl, vec![t1.id, t2.id, t1.id]),
        )
        .await
        .unwrap();
    assert_eq!(created.submission_ids.len(), 2);

    let submission = storage
        .get_submission_by_id_impl(created.submission_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Draft);
    assert_eq!(submission.fields.report_type(), ReportType::Laempl);
    assert_eq!(submission.value, "Flag Ceremony");

    let counts = storage
        .get_assignment_status_counts_impl(created.assignment.id)
        .await
        .unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.draft, 2);

    assert_eq!(storage.get_unread_notification_count_impl(t1.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_assignment_with_unknown_recipient_rolls_back() {
    let storage = setup().await;
    let principal = user(&storage, "principal", UserRole::Principal).await;

    let result = storage
        .create_report_assignment_impl(
            principal.id,
            assignment_request(ReportType::Accomplishment, vec![9999]),
        )
        .await;
    assert!(result.is_err());

    let list = storage
        .list_report_assignments_impl(Default::default())
        .await
        .unwrap();
    assert_eq!(list.pagination.total, 0);
}

#[tokio::test]
async fn test_patch_submission_merges_fields() {
    let storage = setup().await;
    let (_, peer, _) = flag_ceremony(&storage).await;

    let patched = storage
        .patch_submission_impl(
            peer,
            PatchSubmissionRequest {
                status: None,
                value: Some("Flag Ceremony (Mon)".to_string()),
                fields: Some(json!({"narrative": "Held at 7am"})),
            },
        )
        .await
        .unwrap()
        .unwrap();
    let (previous, submission) = patched;
    assert_eq!(previous, SubmissionStatus::Submitted);
    assert_eq!(submission.value, "Flag Ceremony (Mon)");
    let acc = submission.fields.as_accomplishment().unwrap();
    assert_eq!(acc.narrative(), Some("Held at 7am"));
    assert_eq!(image_keys(&submission), vec!["a.jpg"]);

    let bad_status = storage
        .patch_submission_impl(
            peer,
            PatchSubmissionRequest {
                status: Some(7),
                value: None,
                fields: None,
            },
        )
        .await;
    assert!(bad_status.is_err());

    let bad_fields = storage
        .patch_submission_impl(
            peer,
            PatchSubmissionRequest {
                status: None,
                value: None,
                fields: Some(json!(["not", "an", "object"])),
            },
        )
        .await;
    assert!(bad_fields.is_err());

    let missing = storage
        .patch_submission_impl(
            424242,
            PatchSubmissionRequest {
                status: Some(2),
                value: None,
                fields: None,
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_flag_ceremony_end_to_end() {
    let storage = setup().await;
    let (target, p1, p2) = flag_ceremony(&storage).await;

    let plan = storage
        .consolidate_accomplishment_impl(target, input(None))
        .await
        .unwrap();
    assert_eq!(plan.included, vec![p1, p2]);

    let saved = storage.get_submission_by_id_impl(target).await.unwrap().unwrap();
    assert_eq!(image_keys(&saved), vec!["a.jpg", "b.jpg"]);
    assert_eq!(saved.fields.meta().consolidated_images_count, Some(2));
    for peer in [p1, p2] {
        let peer = storage.get_submission_by_id_impl(peer).await.unwrap().unwrap();
        assert_eq!(peer.fields.meta().consolidated_into, Some(target));
    }

    let plan = storage
        .consolidate_accomplishment_impl(target, input(Some(vec![p2])))
        .await
        .unwrap();
    assert_eq!(plan.released, vec![p1]);

    let saved = storage.get_submission_by_id_impl(target).await.unwrap().unwrap();
    assert_eq!(image_keys(&saved), vec!["a.jpg", "b.jpg"]);
    let released = storage.get_submission_by_id_impl(p1).await.unwrap().unwrap();
    assert_eq!(released.fields.meta().consolidated_into, None);
}

#[tokio::test]
async fn test_invalid_peer_json_is_skipped_and_left_untouched() {
    let storage = setup().await;
    let (target, p1, p2) = flag_ceremony(&storage).await;

    Submissions::update_many()
        .col_expr(
            SubmissionColumn::Fields,
            sea_orm::sea_query::Expr::value("{invalid json"),
        )
        .filter(SubmissionColumn::Id.eq(p1))
        .exec(&storage.db)
        .await
        .unwrap();

    let plan = storage
        .consolidate_accomplishment_impl(target, input(None))
        .await
        .unwrap();
    assert_eq!(plan.included, vec![p2]);

    let saved = storage.get_submission_by_id_impl(target).await.unwrap().unwrap();
    assert_eq!(image_keys(&saved), vec!["a.jpg", "b.jpg"]);

    let raw = Submissions::find_by_id(p1)
        .one(&storage.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw.fields.as_deref(), Some("{invalid json"));
}

#[tokio::test]
async fn test_include_consolidated_hides_peers_of_other_targets() {
    let storage = setup().await;
    let (target, _, _) = flag_ceremony(&storage).await;
    storage
        .consolidate_accomplishment_impl(target, input(None))
        .await
        .unwrap();

    // 同一目标仍能看到已汇总进来的提交
    let own = storage
        .list_peer_candidates_impl(
            target,
            filter(UserRole::Coordinator, PeerScope::TargetAssignment, false),
        )
        .await
        .unwrap();
    assert_eq!(own.len(), 2);

    // 同任务下另一位校长的提交作为目标
    let principal = user(&storage, "principal", UserRole::Principal).await;
    let assignment_id = storage
        .get_submission_by_id_impl(target)
        .await
        .unwrap()
        .unwrap()
        .report_assignment_id;
    let other_target = storage
        .create_report_assignment_impl(
            principal.id,
            assignment_request(ReportType::Accomplishment, vec![principal.id]),
        )
        .await
        .unwrap()
        .submission_ids[0];

    let hidden = storage
        .list_peer_candidates_impl(
            other_target,
            filter(UserRole::Principal, PeerScope::Assignment(assignment_id), false),
        )
        .await
        .unwrap();
    assert!(hidden.is_empty());

    let shown = storage
        .list_peer_candidates_impl(
            other_target,
            filter(UserRole::Principal, PeerScope::Assignment(assignment_id), true),
        )
        .await
        .unwrap();
    assert_eq!(shown.len(), 2);
}

#[tokio::test]
async fn test_parent_scope_and_coordinator_visibility() {
    let storage = setup().await;
    let principal = user(&storage, "principal", UserRole::Principal).await;
    let coordinator = user(&storage, "coord", UserRole::Coordinator).await;
    let acc_coordinator = user(&storage, "acc-coord", UserRole::Coordinator).await;
    let teacher = user(&storage, "teacher", UserRole::Teacher).await;

    let parent = storage
        .create_report_assignment_impl(
            principal.id,
            assignment_request(ReportType::Accomplishment, vec![coordinator.id]),
        )
        .await
        .unwrap();
    let target = parent.submission_ids[0];

    let mut child = assignment_request(
        ReportType::Accomplishment,
        vec![teacher.id, acc_coordinator.id],
    );
    child.parent_report_assignment_id = Some(parent.assignment.id);
    let child = storage
        .create_report_assignment_impl(principal.id, child)
        .await
        .unwrap();
    for id in &child.submission_ids {
        submit(&storage, *id, json!({"images": ["x.jpg"]})).await;
    }

    // acc-coord 是成果报告分类（0）下的协调员
    let mut roster = assignment_request(ReportType::Accomplishment, vec![]);
    roster.category_id = 0;
    roster.coordinator_id = Some(acc_coordinator.id);
    storage
        .create_report_assignment_impl(principal.id, roster)
        .await
        .unwrap();

    let scope = PeerScope::ParentAssignment(parent.assignment.id);
    let as_coordinator = storage
        .list_peer_candidates_impl(target, filter(UserRole::Coordinator, scope, false))
        .await
        .unwrap();
    let submitters: Vec<i64> = as_coordinator.iter().map(|c| c.submitted_by).collect();
    assert_eq!(submitters, vec![teacher.id]);

    let as_principal = storage
        .list_peer_candidates_impl(target, filter(UserRole::Principal, scope, false))
        .await
        .unwrap();
    assert_eq!(as_principal.len(), 2);

    let as_teacher = storage
        .list_peer_candidates_impl(target, filter(UserRole::Teacher, scope, false))
        .await
        .unwrap();
    assert_eq!(as_teacher.len(), 1);
}

#[tokio::test]
async fn test_release_all_and_stale_flags() {
    let storage = setup().await;
    let (target, p1, p2) = flag_ceremony(&storage).await;
    storage
        .consolidate_accomplishment_impl(target, input(None))
        .await
        .unwrap();

    let plan = storage
        .release_accomplishment_impl(
            target,
            filter(UserRole::Coordinator, PeerScope::TargetAssignment, false),
        )
        .await
        .unwrap();
    assert_eq!(plan.released, vec![p1, p2]);
    let saved = storage.get_submission_by_id_impl(target).await.unwrap().unwrap();
    assert!(image_keys(&saved).is_empty());

    // 汇总后目标又被手动清空
    storage
        .consolidate_accomplishment_impl(target, input(None))
        .await
        .unwrap();
    storage
        .patch_submission_impl(
            target,
            PatchSubmissionRequest {
                status: None,
                value: None,
                fields: Some(json!({"images": [], "meta": {"consolidatedImagesCount": 0}})),
            },
        )
        .await
        .unwrap();
    let cleared = storage
        .clear_stale_consolidation_flags_impl(
            target,
            filter(UserRole::Coordinator, PeerScope::TargetAssignment, false),
        )
        .await
        .unwrap();
    assert_eq!(cleared, 2);
    let peer = storage.get_submission_by_id_impl(p1).await.unwrap().unwrap();
    assert_eq!(peer.fields.meta().consolidated_into, None);
}

#[tokio::test]
async fn test_table_consolidation() {
    let storage = setup().await;
    let coordinator = user(&storage, "coord", UserRole::Coordinator).await;
    let t1 = user(&storage, "teacher1", UserRole::Teacher).await;
    let t2 = user(&storage, "teacher2", UserRole::Teacher).await;

    let created = storage
        .create_report_assignment_impl(
            coordinator.id,
            assignment_request(ReportType::Laempl, vec![coordinator.id, t1.id, t2.id]),
        )
        .await
        .unwrap();
    let ids = created.submission_ids;
    submit(&storage, ids[1], json!({"rows": [{"key": "Male", "passed": 3, "mps": 80}]})).await;
    submit(&storage, ids[2], json!({"rows": [{"trait": "Male", "passed": 4, "mps": 90}]})).await;

    let plan = storage.consolidate_table_impl(ids[0], input(None)).await.unwrap();
    assert_eq!(plan.rows.len(), 1);
    assert_eq!(plan.rows[0].columns["passed"], 7);
    assert_eq!(plan.rows[0].columns["mps"], 85.0);

    let saved = storage.get_submission_by_id_impl(ids[0]).await.unwrap().unwrap();
    let table = saved.fields.as_table().unwrap();
    assert_eq!(table.rows[0].key, "Male");
    assert_eq!(table.meta.consolidated_from, vec![ids[1], ids[2]]);

    // 成果报告接口不能作用于表格
    assert!(
        storage
            .consolidate_accomplishment_impl(ids[0], input(None))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_delete_assignment_removes_submissions() {
    let storage = setup().await;
    let (target, _, _) = flag_ceremony(&storage).await;
    let assignment_id = storage
        .get_submission_by_id_impl(target)
        .await
        .unwrap()
        .unwrap()
        .report_assignment_id;

    assert!(storage.delete_report_assignment_impl(assignment_id).await.unwrap());
    assert!(storage.get_submission_by_id_impl(target).await.unwrap().is_none());
    assert!(
        !storage
            .delete_report_assignment_impl(assignment_id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_notifications_are_private_to_their_recipient() {
    let storage = setup().await;
    let principal = user(&storage, "principal", UserRole::Principal).await;
    let t1 = user(&storage, "teacher1", UserRole::Teacher).await;
    let t2 = user(&storage, "teacher2", UserRole::Teacher).await;
    storage
        .create_report_assignment_impl(
            principal.id,
            assignment_request(ReportType::Laempl, vec![t1.id, t2.id]),
        )
        .await
        .unwrap();

    let inbox = storage
        .list_notifications_with_pagination_impl(t1.id, NotificationListQuery {
            pagination: PaginationQuery::default(),
            unread_only: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(inbox.items.len(), 1);
    let notification_id = inbox.items[0].id;

    // 他人的通知视为不存在
    assert!(
        !storage
            .mark_notification_as_read_impl(t2.id, notification_id)
            .await
            .unwrap()
    );
    assert!(
        storage
            .mark_notification_as_read_impl(t1.id, notification_id)
            .await
            .unwrap()
    );
    // 重复标记仍算成功
    assert!(
        storage
            .mark_notification_as_read_impl(t1.id, notification_id)
            .await
            .unwrap()
    );
    assert_eq!(storage.get_unread_notification_count_impl(t1.id).await.unwrap(), 0);

    assert_eq!(storage.mark_all_notifications_as_read_impl(t2.id).await.unwrap(), 1);
    assert_eq!(storage.mark_all_notifications_as_read_impl(t2.id).await.unwrap(), 0);
}

#[test]
fn test_database_url_inference() {
    assert_eq!(
        SeaOrmStorage::build_database_url("school_reports.db").unwrap(),
        "sqlite://school_reports.db?mode=rwc"
    );
    assert_eq!(
        SeaOrmStorage::build_database_url("postgres://u:p@db/reports").unwrap(),
        "postgres://u:p@db/reports"
    );
    assert!(SeaOrmStorage::build_database_url("reports.csv").is_err());
}
