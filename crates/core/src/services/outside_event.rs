//! Outside event service.
//!
//! User-proposed events. Creation is gated by admin policy; approval is
//! gated by a PRESENT attendance record on the event's date and awards the
//! proposal's point value to the owner atomically with the approval flag.
//! Rejection deletes the proposal.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use attenda_common::{AppError, AppResult, IdGenerator};
use attenda_db::{
    entities::{User, outside_event, user},
    repositories::{
        AdminSettingsRepository, AttendanceRepository, OutsideEventRepository, UserRepository,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};

use crate::services::attendance::utc_day_window;
use crate::services::push::{PendingPush, PushService, dispatch_after_commit};

/// Input for proposing an outside event.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutsideEventInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub point_value: i32,

    /// The day the event took place (ISO 8601).
    pub date: chrono::DateTime<Utc>,
}

/// Admin decision on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalDecision {
    /// Approve and award points.
    Approve,
    /// Reject and delete the proposal.
    Reject,
}

/// The outcome of an admin decision.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    /// The proposal was approved.
    Approved(outside_event::Model),
    /// The proposal was rejected and deleted.
    Rejected,
}

/// A proposal joined with its owner (admin review queue).
#[derive(Debug, Clone)]
pub struct OutsideEventWithUser {
    /// The proposal.
    pub event: outside_event::Model,
    /// The proposing user.
    pub user: Option<user::Model>,
}

/// A user's approved proposals with totals.
#[derive(Debug, Clone)]
pub struct OutsideEventSummary {
    /// The approved proposals, newest first.
    pub events: Vec<outside_event::Model>,
    /// Number of approved proposals.
    pub total_count: usize,
    /// Sum of awarded points.
    pub total_points: i32,
}

/// Outside event service for business logic.
#[derive(Clone)]
pub struct OutsideEventService {
    db: Arc<DatabaseConnection>,
    outside_repo: OutsideEventRepository,
    user_repo: UserRepository,
    attendance_repo: AttendanceRepository,
    settings_repo: AdminSettingsRepository,
    push: PushService,
    id_gen: IdGenerator,
}

impl OutsideEventService {
    /// Create a new outside event service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        outside_repo: OutsideEventRepository,
        user_repo: UserRepository,
        attendance_repo: AttendanceRepository,
        settings_repo: AdminSettingsRepository,
        push: PushService,
    ) -> Self {
        Self {
            db,
            outside_repo,
            user_repo,
            attendance_repo,
            settings_repo,
            push,
            id_gen: IdGenerator::new(),
        }
    }

    /// Propose an outside event. Gated by the admin policy switch.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateOutsideEventInput,
    ) -> AppResult<outside_event::Model> {
        input.validate()?;

        let settings = self.settings_repo.get().await?;
        if !settings.allow_custom_point {
            return Err(AppError::Forbidden(
                "Outside event creation is currently disabled by the administrator".to_string(),
            ));
        }

        self.user_repo.get_by_id(user_id).await?;

        let model = outside_event::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            point_value: Set(input.point_value),
            date: Set(input.date.into()),
            approved: Set(false),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        self.outside_repo.create(model).await
    }

    /// Admin review queue: unapproved proposals with their owners.
    pub async fn list_unapproved(&self) -> AppResult<Vec<OutsideEventWithUser>> {
        let events = self.outside_repo.find_unapproved().await?;

        let user_ids: Vec<String> = events.iter().map(|e| e.user_id.clone()).collect();
        let users = self.user_repo.find_by_ids(&user_ids).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let user = users.iter().find(|u| u.id == event.user_id).cloned();
                OutsideEventWithUser { event, user }
            })
            .collect())
    }

    /// Decide a proposal: approve (awards points) or reject (deletes).
    ///
    /// Approval requires a PRESENT attendance record for the owner inside
    /// the event's UTC calendar day. An approved proposal cannot be
    /// decided again.
    pub async fn decide(
        &self,
        event_id: &str,
        decision: ApprovalDecision,
    ) -> AppResult<DecisionOutcome> {
        let event = self.outside_repo.get_by_id(event_id).await?;

        if event.approved {
            return Err(AppError::BadRequest(
                "Event is already approved".to_string(),
            ));
        }

        let owner = self.user_repo.get_by_id(&event.user_id).await?;

        match decision {
            ApprovalDecision::Approve => self.approve(event, &owner).await,
            ApprovalDecision::Reject => self.reject(event, &owner).await,
        }
    }

    async fn approve(
        &self,
        event: outside_event::Model,
        owner: &user::Model,
    ) -> AppResult<DecisionOutcome> {
        let (start, end) = utc_day_window(event.date.with_timezone(&Utc));
        let attendance = self
            .attendance_repo
            .find_present_in_window(&event.user_id, start, end)
            .await?;

        if attendance.is_none() {
            return Err(AppError::BadRequest(
                "User was not marked PRESENT on the event date. Cannot approve".to_string(),
            ));
        }

        let point_value = event.point_value;
        let title = event.title.clone();
        let event_id = event.id.clone();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut active: outside_event::ActiveModel = event.into();
        active.approved = Set(true);
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        User::update_many()
            .col_expr(
                user::Column::Point,
                Expr::col(user::Column::Point).add(point_value),
            )
            .filter(user::Column::Id.eq(owner.id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if owner.is_event_approve_notify {
            if let Some(token) = owner.fcm_token.clone() {
                let pending = vec![PendingPush {
                    token,
                    title: "Points Awarded!".to_string(),
                    body: format!(
                        "Your outside event \"{title}\" has been approved. {point_value} points added!"
                    ),
                    data: Some(serde_json::json!({
                        "status": "approved",
                        "eventId": event_id,
                    })),
                }];
                dispatch_after_commit(&self.push, pending).await;
            }
        }

        Ok(DecisionOutcome::Approved(updated))
    }

    async fn reject(
        &self,
        event: outside_event::Model,
        owner: &user::Model,
    ) -> AppResult<DecisionOutcome> {
        let deleted = self.outside_repo.delete_by_id(&event.id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Outside event not found".to_string()));
        }

        if owner.is_event_approve_notify {
            if let Some(token) = owner.fcm_token.clone() {
                let pending = vec![PendingPush {
                    token,
                    title: "Event Rejected".to_string(),
                    body: format!(
                        "Your outside event \"{}\" was not approved and has been removed.",
                        event.title
                    ),
                    data: Some(serde_json::json!({
                        "status": "rejected",
                        "eventId": event.id,
                    })),
                }];
                dispatch_after_commit(&self.push, pending).await;
            }
        }

        Ok(DecisionOutcome::Rejected)
    }

    /// A user's approved proposals with totals.
    pub async fn user_summary(&self, user_id: &str) -> AppResult<OutsideEventSummary> {
        let events = self.outside_repo.find_approved_by_user(user_id).await?;

        let total_count = events.len();
        let total_points = events.iter().map(|e| e.point_value).sum();

        Ok(OutsideEventSummary {
            events,
            total_count,
            total_points,
        })
    }

    /// Delete an unapproved proposal. Approved proposals are immutable.
    pub async fn delete_unapproved(&self, event_id: &str) -> AppResult<()> {
        let event = self.outside_repo.get_by_id(event_id).await?;

        if event.approved {
            return Err(AppError::BadRequest(
                "Cannot delete an approved event".to_string(),
            ));
        }

        self.outside_repo.delete_by_id(event_id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attenda_db::entities::admin_settings;
    use attenda_db::entities::attendance::{self, AttendanceStatus};
    use attenda_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::services::push::NoOpPush;

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> OutsideEventService {
        OutsideEventService::new(
            Arc::clone(&db),
            OutsideEventRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            AttendanceRepository::new(Arc::clone(&db)),
            AdminSettingsRepository::new(Arc::clone(&db)),
            Arc::new(NoOpPush),
        )
    }

    fn test_settings(allow_custom: bool) -> admin_settings::Model {
        admin_settings::Model {
            id: admin_settings::SINGLETON_ID.to_string(),
            auto_approve_point: true,
            allow_custom_point: allow_custom,
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

    fn test_outside_event(id: &str, approved: bool) -> outside_event::Model {
        outside_event::Model {
            id: id.to_string(),
            title: "Volunteering".to_string(),
            description: None,
            point_value: 15,
            date: Utc::now().into(),
            approved,
            user_id: "user1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_denied_by_policy() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_settings(false)]])
                .into_connection(),
        );
        let service = create_service(db);

        let input = CreateOutsideEventInput {
            title: "Volunteering".to_string(),
            description: None,
            point_value: 15,
            date: Utc::now(),
        };
        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_decide_already_approved_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_outside_event("oe1", true)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.decide("oe1", ApprovalDecision::Approve).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already approved")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_approve_requires_attendance() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_outside_event("oe1", false)]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([Vec::<attendance::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.decide("oe1", ApprovalDecision::Approve).await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("PRESENT")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_approve_awards_points() {
        let proposal = test_outside_event("oe1", false);
        let mut approved = proposal.clone();
        approved.approved = true;

        let present = attendance::Model {
            id: "att1".to_string(),
            user_id: "user1".to_string(),
            status: AttendanceStatus::Present,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[proposal]])
                .append_query_results([[test_user("user1")]])
                .append_query_results([[present]])
                .append_query_results([[approved]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let outcome = service.decide("oe1", ApprovalDecision::Approve).await.unwrap();
        match outcome {
            DecisionOutcome::Approved(model) => assert!(model.approved),
            DecisionOutcome::Rejected => panic!("Expected approval"),
        }
    }

    #[tokio::test]
    async fn test_reject_deletes_row() {
        // Scenario E: rejection removes the row; a second attempt on the
        // same ID would not find it
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_outside_event("oe1", false)]])
                .append_query_results([[test_user("user1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = create_service(db);

        let outcome = service.decide("oe1", ApprovalDecision::Reject).await.unwrap();
        assert!(matches!(outcome, DecisionOutcome::Rejected));
    }

    #[tokio::test]
    async fn test_reject_missing_row_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<outside_event::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.decide("gone", ApprovalDecision::Reject).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_approved_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_outside_event("oe1", true)]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.delete_unapproved("oe1").await;
        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("approved")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_summary_totals() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    test_outside_event("oe1", true),
                    test_outside_event("oe2", true),
                ]])
                .into_connection(),
        );
        let service = create_service(db);

        let summary = service.user_summary("user1").await.unwrap();
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.total_points, 30);
    }
}
