//! Enrollment service.
//!
//! The claim workflow core: self-enrollment with an atomic capacity claim,
//! the batch points claim (auto-approved or flagged for review), and the
//! admin status transitions. Every multi-row mutation runs in a single
//! transaction; notifications go out only after commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use attenda_common::{AppError, AppResult, IdGenerator};
use attenda_db::{
    entities::{
        Enrollment, Event, User,
        enrollment::{self, EnrollmentStatus},
        event, user,
    },
    repositories::{
        AdminSettingsRepository, AttendanceRepository, EnrollmentRepository, EventRepository,
        UserRepository,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};

use crate::services::attendance::utc_day_window;
use crate::services::push::{PendingPush, PushService, dispatch_after_commit};

/// Input for the batch points claim.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPointsInput {
    /// Enrollment IDs to claim points for.
    #[validate(length(min = 1))]
    pub enrolled_ids: Vec<String>,
}

/// An enrollment joined with its event.
#[derive(Debug, Clone)]
pub struct EnrollmentWithEvent {
    /// The enrollment row.
    pub enrollment: enrollment::Model,
    /// The event, if still present.
    pub event: Option<event::Model>,
}

/// An enrollment joined with both its user and event (admin review queue).
#[derive(Debug, Clone)]
pub struct ClaimedEnrollment {
    /// The enrollment row.
    pub enrollment: enrollment::Model,
    /// The claiming user.
    pub user: Option<user::Model>,
    /// The event claimed against.
    pub event: Option<event::Model>,
}

/// Enrollment service for business logic.
#[derive(Clone)]
pub struct EnrollmentService {
    db: Arc<DatabaseConnection>,
    enrollment_repo: EnrollmentRepository,
    event_repo: EventRepository,
    user_repo: UserRepository,
    attendance_repo: AttendanceRepository,
    settings_repo: AdminSettingsRepository,
    push: PushService,
    id_gen: IdGenerator,
}

impl EnrollmentService {
    /// Create a new enrollment service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        enrollment_repo: EnrollmentRepository,
        event_repo: EventRepository,
        user_repo: UserRepository,
        attendance_repo: AttendanceRepository,
        settings_repo: AdminSettingsRepository,
        push: PushService,
    ) -> Self {
        Self {
            db,
            enrollment_repo,
            event_repo,
            user_repo,
            attendance_repo,
            settings_repo,
            push,
            id_gen: IdGenerator::new(),
        }
    }

    /// Enroll a user into an event.
    ///
    /// The enrollment insert and the capacity claim happen in one
    /// transaction. The capacity claim is a single conditional UPDATE that
    /// only succeeds while `student_enrolled < max_student`, so two racing
    /// enrollments cannot both take the last seat; the unique
    /// (user, event) index is the backstop against double-enrollment.
    pub async fn enroll(&self, user_id: &str, event_id: &str) -> AppResult<enrollment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let event = Event::find_by_id(event_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::BadRequest("Event not found".to_string()))?;

        let existing = Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::EventId.eq(event_id))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(AppError::BadRequest(
                "Already enrolled in this event".to_string(),
            ));
        }

        // Claim a seat: increment only while below capacity
        let claimed = Event::update_many()
            .col_expr(
                event::Column::StudentEnrolled,
                Expr::col(event::Column::StudentEnrolled).add(1),
            )
            .filter(event::Column::Id.eq(event_id))
            .filter(
                Expr::col(event::Column::StudentEnrolled)
                    .lt(Expr::col(event::Column::MaxStudent)),
            )
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if claimed.rows_affected == 0 {
            return Err(AppError::BadRequest(
                "Event has reached maximum capacity".to_string(),
            ));
        }

        let model = enrollment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            event_id: Set(event.id),
            status: Set(EnrollmentStatus::Join),
            claim_point: Set(false),
            reminder_sent: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Claim points for a batch of enrollments.
    ///
    /// Existence is validated all-or-nothing: any missing or foreign ID
    /// aborts the whole call with the missing IDs enumerated. State checks
    /// are per-row, first violation aborts. The auto-approve policy decides
    /// whether the claim transitions straight to ATTENDED with points, or
    /// only flags the rows for admin review.
    pub async fn claim_points(
        &self,
        user_id: &str,
        input: ClaimPointsInput,
    ) -> AppResult<Vec<enrollment::Model>> {
        input.validate()?;
        let enrolled_ids = input.enrolled_ids;

        let settings = self.settings_repo.get().await?;
        let auto_approve = settings.auto_approve_point;

        let enrollments = self
            .enrollment_repo
            .find_by_ids_for_user(&enrolled_ids, user_id)
            .await?;

        let found: std::collections::HashSet<&str> =
            enrollments.iter().map(|e| e.id.as_str()).collect();
        let missing: Vec<&str> = enrolled_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::EnrollmentNotFound(missing.join(", ")));
        }

        for e in &enrollments {
            if e.status != EnrollmentStatus::Join {
                return Err(AppError::BadRequest(format!(
                    "Enrollment {} must have status JOIN to claim points",
                    e.id
                )));
            }
            if e.claim_point {
                return Err(AppError::BadRequest(format!(
                    "Points already claimed for enrollment {}",
                    e.id
                )));
            }
        }

        let event_ids: Vec<String> = enrollments.iter().map(|e| e.event_id.clone()).collect();
        let point_values: HashMap<String, i32> = self
            .event_repo
            .find_by_ids(&event_ids)
            .await?
            .into_iter()
            .map(|ev| (ev.id, ev.point_value))
            .collect();

        let user = self.user_repo.get_by_id(user_id).await?;

        if auto_approve {
            self.claim_auto_approve(&user, enrollments, &point_values)
                .await
        } else {
            self.claim_for_review(enrollments).await
        }
    }

    /// Auto-approve branch: ATTENDED + claim flag + points, then notify.
    async fn claim_auto_approve(
        &self,
        user: &user::Model,
        enrollments: Vec<enrollment::Model>,
        point_values: &HashMap<String, i32>,
    ) -> AppResult<Vec<enrollment::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut updated = Vec::with_capacity(enrollments.len());
        let mut pending = Vec::new();

        for e in enrollments {
            let point_value = point_values.get(&e.event_id).copied().unwrap_or_default();

            let mut active: enrollment::ActiveModel = e.into();
            active.status = Set(EnrollmentStatus::Attended);
            active.claim_point = Set(true);
            let row = active
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            User::update_many()
                .col_expr(
                    user::Column::Point,
                    Expr::col(user::Column::Point).add(point_value),
                )
                .filter(user::Column::Id.eq(user.id.as_str()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if let Some(token) = user.fcm_token.as_deref() {
                if user.is_event_approve_notify {
                    pending.push(PendingPush {
                        token: token.to_string(),
                        title: "Claim Approved!".to_string(),
                        body: "Your claimed point has been approved.".to_string(),
                        data: Some(serde_json::json!({ "status": "approved" })),
                    });
                }
            }

            updated.push(row);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        dispatch_after_commit(&self.push, pending).await;

        Ok(updated)
    }

    /// Manual branch: flag for admin review only.
    async fn claim_for_review(
        &self,
        enrollments: Vec<enrollment::Model>,
    ) -> AppResult<Vec<enrollment::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut updated = Vec::with_capacity(enrollments.len());
        for e in enrollments {
            let mut active: enrollment::ActiveModel = e.into();
            active.claim_point = Set(true);
            let row = active
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            updated.push(row);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Admin transition of an enrollment's status.
    ///
    /// ATTENDED is terminal: re-entering it is rejected, which is what
    /// keeps the point award at-most-once. An ATTENDED target additionally
    /// requires a PRESENT attendance record inside the event's UTC
    /// calendar day. Points move only on ATTENDED; SCANNED and REJECTED
    /// carry none.
    pub async fn update_status(
        &self,
        enrollment_id: &str,
        target: EnrollmentStatus,
    ) -> AppResult<enrollment::Model> {
        let found = self.enrollment_repo.get_by_id(enrollment_id).await?;

        if found.status == EnrollmentStatus::Attended {
            return Err(AppError::BadRequest(
                "User is already marked as ATTENDED".to_string(),
            ));
        }

        let event = self.event_repo.get_by_id(&found.event_id).await?;
        let user = self.user_repo.get_by_id(&found.user_id).await?;

        if target == EnrollmentStatus::Attended {
            let (start, end) = utc_day_window(event.date.with_timezone(&Utc));
            let attendance = self
                .attendance_repo
                .find_present_in_window(&found.user_id, start, end)
                .await?;

            if attendance.is_none() {
                return Err(AppError::BadRequest(
                    "User was not marked PRESENT on the event date. Cannot mark as ATTENDED"
                        .to_string(),
                ));
            }
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut active: enrollment::ActiveModel = found.into();
        active.status = Set(target);
        if target == EnrollmentStatus::Attended {
            active.claim_point = Set(true);
        }
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if target == EnrollmentStatus::Attended {
            User::update_many()
                .col_expr(
                    user::Column::Point,
                    Expr::col(user::Column::Point).add(event.point_value),
                )
                .filter(user::Column::Id.eq(user.id.as_str()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if target == EnrollmentStatus::Attended && user.is_event_approve_notify {
            if let Some(token) = user.fcm_token {
                let pending = vec![PendingPush {
                    token,
                    title: "Claim Approved!".to_string(),
                    body: "Your claimed point has been approved.".to_string(),
                    data: Some(serde_json::json!({ "status": "approved" })),
                }];
                dispatch_after_commit(&self.push, pending).await;
            }
        }

        Ok(updated)
    }

    /// Admin review queue: claimed enrollments still in JOIN.
    pub async fn claimed_pending(&self) -> AppResult<Vec<ClaimedEnrollment>> {
        let enrollments = self.enrollment_repo.find_claimed_pending().await?;

        let user_ids: Vec<String> = enrollments.iter().map(|e| e.user_id.clone()).collect();
        let event_ids: Vec<String> = enrollments.iter().map(|e| e.event_id.clone()).collect();
        let users = self.user_repo.find_by_ids(&user_ids).await?;
        let events = self.event_repo.find_by_ids(&event_ids).await?;

        Ok(enrollments
            .into_iter()
            .map(|enrollment| {
                let user = users.iter().find(|u| u.id == enrollment.user_id).cloned();
                let event = events.iter().find(|e| e.id == enrollment.event_id).cloned();
                ClaimedEnrollment {
                    enrollment,
                    user,
                    event,
                }
            })
            .collect())
    }

    /// A user's JOIN enrollments with event summaries.
    pub async fn user_joined(&self, user_id: &str) -> AppResult<Vec<EnrollmentWithEvent>> {
        let enrollments = self
            .enrollment_repo
            .find_by_user_and_status(user_id, EnrollmentStatus::Join)
            .await?;

        let event_ids: Vec<String> = enrollments.iter().map(|e| e.event_id.clone()).collect();
        let events = self.event_repo.find_by_ids(&event_ids).await?;

        Ok(enrollments
            .into_iter()
            .map(|enrollment| {
                let event = events.iter().find(|e| e.id == enrollment.event_id).cloned();
                EnrollmentWithEvent { enrollment, event }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attenda_db::entities::admin_settings;
    use attenda_db::entities::attendance::{self, AttendanceStatus};
    use attenda_db::entities::event::EventType;
    use attenda_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::services::push::NoOpPush;

    fn test_settings(auto_approve: bool) -> admin_settings::Model {
        admin_settings::Model {
            id: admin_settings::SINGLETON_ID.to_string(),
            auto_approve_point: auto_approve,
            allow_custom_point: true,
            create_event_notify: true,
            event_reminders: true,
            updated_at: None,
        }
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: None,
            password_hash: "x".to_string(),
            role: UserRole::User,
            is_active: true,
            is_deleted: false,
            point: 0,
            fcm_token: None,
            image_url: None,
            is_event_approve_notify: true,
            is_new_event_notify: true,
            is_event_reminder: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_event(id: &str, point_value: i32) -> event::Model {
        event::Model {
            id: id.to_string(),
            title: "Weekly meetup".to_string(),
            description: "desc".to_string(),
            point_value,
            date: Utc::now().into(),
            time: "18:00".to_string(),
            max_student: 10,
            student_enrolled: 0,
            event_type: EventType::Inside,
            created_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_enrollment(id: &str, user_id: &str, event_id: &str) -> enrollment::Model {
        enrollment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            status: EnrollmentStatus::Join,
            claim_point: false,
            reminder_sent: false,
            created_at: Utc::now().into(),
        }
    }

    fn create_service(db: Arc<DatabaseConnection>) -> EnrollmentService {
        EnrollmentService::new(
            Arc::clone(&db),
            EnrollmentRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            AttendanceRepository::new(Arc::clone(&db)),
            AdminSettingsRepository::new(Arc::clone(&db)),
            Arc::new(NoOpPush),
        )
    }

    #[tokio::test]
    async fn test_enroll_unknown_event_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.enroll("user1", "missing").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_enroll_twice_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([[test_enrollment("enr1", "user1", "ev1")]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.enroll("user1", "ev1").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Already enrolled")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_full_event_fails() {
        // Conditional capacity claim affects zero rows on a full event
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([Vec::<enrollment::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.enroll("user1", "ev1").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("maximum capacity")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_creates_join_row() {
        let inserted = test_enrollment("enr1", "user1", "ev1");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([Vec::<enrollment::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[inserted]])
                .into_connection(),
        );
        let service = create_service(db);

        let created = service.enroll("user1", "ev1").await.unwrap();
        assert_eq!(created.status, EnrollmentStatus::Join);
        assert!(!created.claim_point);
    }

    #[tokio::test]
    async fn test_claim_missing_ids_enumerated() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(false)]])
                .append_query_results([vec![test_enrollment("enr1", "user1", "ev1")]])
                .into_connection(),
        );
        let service = create_service(db);

        let input = ClaimPointsInput {
            enrolled_ids: vec!["enr1".to_string(), "enr2".to_string()],
        };
        let result = service.claim_points("user1", input).await;
        match result {
            Err(AppError::EnrollmentNotFound(msg)) => assert!(msg.contains("enr2")),
            other => panic!("Expected EnrollmentNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_claim_rejects_non_join_status() {
        let mut enrollment = test_enrollment("enr1", "user1", "ev1");
        enrollment.status = EnrollmentStatus::Rejected;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(false)]])
                .append_query_results([[enrollment]])
                .into_connection(),
        );
        let service = create_service(db);

        let input = ClaimPointsInput {
            enrolled_ids: vec!["enr1".to_string()],
        };
        let result = service.claim_points("user1", input).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_claim_rejects_already_claimed() {
        let mut enrollment = test_enrollment("enr1", "user1", "ev1");
        enrollment.claim_point = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(false)]])
                .append_query_results([[enrollment]])
                .into_connection(),
        );
        let service = create_service(db);

        let input = ClaimPointsInput {
            enrolled_ids: vec!["enr1".to_string()],
        };
        let result = service.claim_points("user1", input).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already claimed")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_claim_manual_branch_flags_only() {
        // Scenario B: auto-approve off, claim flags the row and leaves
        // status and balance untouched
        let enrollment = test_enrollment("enr1", "user1", "ev1");
        let mut flagged = enrollment.clone();
        flagged.claim_point = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(false)]])
                .append_query_results([[enrollment]])
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([[flagged]])
                .into_connection(),
        );
        let service = create_service(db);

        let input = ClaimPointsInput {
            enrolled_ids: vec!["enr1".to_string()],
        };
        let updated = service.claim_points("user1", input).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert!(updated[0].claim_point);
        assert_eq!(updated[0].status, EnrollmentStatus::Join);
    }

    #[tokio::test]
    async fn test_claim_auto_branch_attends_and_awards() {
        // Scenario C: auto-approve on, claim transitions to ATTENDED and
        // increments the balance in the same transaction
        let enrollment = test_enrollment("enr1", "user1", "ev1");
        let mut attended = enrollment.clone();
        attended.status = EnrollmentStatus::Attended;
        attended.claim_point = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(true)]])
                .append_query_results([[enrollment]])
                .append_query_results([[test_event("ev1", 25)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([[attended]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let input = ClaimPointsInput {
            enrolled_ids: vec!["enr1".to_string()],
        };
        let updated = service.claim_points("user1", input).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, EnrollmentStatus::Attended);
        assert!(updated[0].claim_point);
    }

    #[tokio::test]
    async fn test_update_status_rejects_reentering_attended() {
        let mut enrollment = test_enrollment("enr1", "user1", "ev1");
        enrollment.status = EnrollmentStatus::Attended;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[enrollment]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .update_status("enr1", EnrollmentStatus::Attended)
            .await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already marked")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_status_requires_attendance_for_attended() {
        // Scenario D: no PRESENT record on the event date
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_enrollment("enr1", "user1", "ev1")]])
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([Vec::<attendance::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service
            .update_status("enr1", EnrollmentStatus::Attended)
            .await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("PRESENT")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_status_rejected_skips_attendance_gate() {
        // REJECTED transitions need no attendance record and award nothing
        let enrollment = test_enrollment("enr1", "user1", "ev1");
        let mut rejected = enrollment.clone();
        rejected.status = EnrollmentStatus::Rejected;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[enrollment]])
                .append_query_results([[test_event("ev1", 10)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([[rejected]])
                .into_connection(),
        );
        let service = create_service(db);

        let updated = service
            .update_status("enr1", EnrollmentStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Rejected);
        assert!(!updated.claim_point);
    }

    #[tokio::test]
    async fn test_update_status_attended_awards_points() {
        let enrollment = test_enrollment("enr1", "user1", "ev1");
        let mut attended = enrollment.clone();
        attended.status = EnrollmentStatus::Attended;
        attended.claim_point = true;

        let present = attendance::Model {
            id: "att1".to_string(),
            user_id: "user1".to_string(),
            status: AttendanceStatus::Present,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[enrollment]])
                .append_query_results([[test_event("ev1", 40)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([[present]])
                .append_query_results([[attended]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let updated = service
            .update_status("enr1", EnrollmentStatus::Attended)
            .await
            .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Attended);
        assert!(updated.claim_point);
    }
}
