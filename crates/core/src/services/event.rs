//! Event service.

use chrono::{NaiveTime, Utc};
use serde::Deserialize;
use validator::Validate;

use attenda_common::{AppError, AppResult, IdGenerator};
use attenda_db::{
    entities::{
        enrollment::{self, EnrollmentStatus},
        event::{self, EventType},
    },
    repositories::{
        AdminSettingsRepository, EnrollmentRepository, EventRepository, UserRepository,
    },
};
use sea_orm::Set;

use crate::services::enrollment::EnrollmentWithEvent;
use crate::services::push::PushService;

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 4096))]
    pub description: String,

    #[validate(range(min = 0))]
    pub point_value: i32,

    /// Event date (ISO 8601).
    pub date: chrono::DateTime<Utc>,

    /// Start time, "HH:MM".
    pub time: String,

    #[validate(range(min = 1))]
    pub max_student: i32,

    pub event_type: Option<EventType>,
}

/// Input for updating an event. Only provided fields change.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub point_value: Option<i32>,

    pub date: Option<chrono::DateTime<Utc>>,

    pub time: Option<String>,

    #[validate(range(min = 1))]
    pub max_student: Option<i32>,

    pub event_type: Option<EventType>,
}

/// An upcoming event flagged with the caller's enrollment state.
#[derive(Debug, Clone)]
pub struct UpcomingEvent {
    /// The event.
    pub event: event::Model,
    /// Whether the requesting user is enrolled.
    pub enrolled: bool,
}

/// An event with its enrollment roster.
#[derive(Debug, Clone)]
pub struct EventWithEnrollments {
    /// The event.
    pub event: event::Model,
    /// All enrollments of this event.
    pub enrollments: Vec<enrollment::Model>,
}

/// A user's enrollments of one status, with totals.
#[derive(Debug, Clone)]
pub struct EnrollmentStats {
    /// The enrollments with event data.
    pub enrollments: Vec<EnrollmentWithEvent>,
    /// Number of enrollments.
    pub total: usize,
    /// Sum of the events' point values (ATTENDED stats only; 0 otherwise).
    pub total_points: i32,
}

/// Validate an "HH:MM" start time string.
fn validate_time(time: &str) -> AppResult<()> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::Validation("Invalid time. Use HH:MM".to_string()))
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    enrollment_repo: EnrollmentRepository,
    user_repo: UserRepository,
    settings_repo: AdminSettingsRepository,
    push: PushService,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub fn new(
        event_repo: EventRepository,
        enrollment_repo: EnrollmentRepository,
        user_repo: UserRepository,
        settings_repo: AdminSettingsRepository,
        push: PushService,
    ) -> Self {
        Self {
            event_repo,
            enrollment_repo,
            user_repo,
            settings_repo,
            push,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new event, broadcasting to opted-in users if the admin
    /// policy allows it. The broadcast is fired after the insert and never
    /// fails the call.
    pub async fn create(
        &self,
        input: CreateEventInput,
        created_by: Option<&str>,
    ) -> AppResult<event::Model> {
        input.validate()?;
        validate_time(&input.time)?;

        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            point_value: Set(input.point_value),
            date: Set(input.date.into()),
            time: Set(input.time),
            max_student: Set(input.max_student),
            student_enrolled: Set(0),
            event_type: Set(input.event_type.unwrap_or(EventType::Inside)),
            created_by: Set(created_by.map(ToString::to_string)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.event_repo.create(model).await?;

        self.broadcast_new_event(&created).await;

        Ok(created)
    }

    /// Push a new-event notification to every opted-in user.
    async fn broadcast_new_event(&self, created: &event::Model) {
        let notify = match self.settings_repo.get().await {
            Ok(settings) => settings.create_event_notify,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read admin settings for broadcast");
                return;
            }
        };
        if !notify {
            return;
        }

        let tokens = match self.user_repo.find_new_event_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to collect broadcast tokens");
                return;
            }
        };
        if tokens.is_empty() {
            return;
        }

        let body = format!("A new event \"{}\" is now available!", created.title);
        let data = serde_json::json!({ "eventType": "new_event", "eventId": created.id });
        if let Err(e) = self
            .push
            .send_bulk_push(&tokens, "New Event Created!", &body, Some(data))
            .await
        {
            tracing::warn!(error = %e, "Failed to broadcast new event");
        }
    }

    /// Update an event.
    pub async fn update(&self, event_id: &str, input: UpdateEventInput) -> AppResult<event::Model> {
        input.validate()?;
        if let Some(time) = input.time.as_deref() {
            validate_time(time)?;
        }

        let event = self.event_repo.get_by_id(event_id).await?;
        let mut active: event::ActiveModel = event.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(point_value) = input.point_value {
            active.point_value = Set(point_value);
        }
        if let Some(date) = input.date {
            active.date = Set(date.into());
        }
        if let Some(time) = input.time {
            active.time = Set(time);
        }
        if let Some(max_student) = input.max_student {
            active.max_student = Set(max_student);
        }
        if let Some(event_type) = input.event_type {
            active.event_type = Set(event_type);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.event_repo.update(active).await
    }

    /// Delete an event. Enrollments cascade at the storage layer.
    pub async fn delete(&self, event_id: &str) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        self.event_repo.delete_by_id(event_id).await?;
        Ok(event)
    }

    /// Get an event with its enrollment roster.
    pub async fn get(&self, event_id: &str) -> AppResult<EventWithEnrollments> {
        let event = self.event_repo.get_by_id(event_id).await?;
        let enrollments = self.enrollment_repo.find_by_event(event_id).await?;
        Ok(EventWithEnrollments { event, enrollments })
    }

    /// List all events.
    pub async fn list(&self) -> AppResult<Vec<event::Model>> {
        self.event_repo.find_all().await
    }

    /// Events from the start of today onward, flagged with the caller's
    /// enrollment state.
    pub async fn upcoming(&self, user_id: &str) -> AppResult<Vec<UpcomingEvent>> {
        let (start_of_today, _) = crate::services::attendance::utc_day_window(Utc::now());
        let events = self.event_repo.find_from(start_of_today).await?;

        let enrolled_event_ids: std::collections::HashSet<String> = self
            .enrollment_repo
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(|e| e.event_id)
            .collect();

        Ok(events
            .into_iter()
            .map(|event| {
                let enrolled = enrolled_event_ids.contains(&event.id);
                UpcomingEvent { event, enrolled }
            })
            .collect())
    }

    /// A user's ATTENDED enrollments with totals.
    pub async fn attended_stats(&self, user_id: &str) -> AppResult<EnrollmentStats> {
        self.user_repo.get_by_id(user_id).await?;
        self.stats_for_status(user_id, EnrollmentStatus::Attended, true)
            .await
    }

    /// A user's JOIN enrollments with totals.
    pub async fn joined_stats(&self, user_id: &str) -> AppResult<EnrollmentStats> {
        self.user_repo.get_by_id(user_id).await?;
        self.stats_for_status(user_id, EnrollmentStatus::Join, false)
            .await
    }

    async fn stats_for_status(
        &self,
        user_id: &str,
        status: EnrollmentStatus,
        with_points: bool,
    ) -> AppResult<EnrollmentStats> {
        let rows = self
            .enrollment_repo
            .find_by_user_and_status(user_id, status)
            .await?;

        let event_ids: Vec<String> = rows.iter().map(|e| e.event_id.clone()).collect();
        let events = self.event_repo.find_by_ids(&event_ids).await?;

        let enrollments: Vec<EnrollmentWithEvent> = rows
            .into_iter()
            .map(|enrollment| {
                let event = events.iter().find(|e| e.id == enrollment.event_id).cloned();
                EnrollmentWithEvent { enrollment, event }
            })
            .collect();

        let total = enrollments.len();
        let total_points = if with_points {
            enrollments
                .iter()
                .filter_map(|e| e.event.as_ref().map(|ev| ev.point_value))
                .sum()
        } else {
            0
        };

        Ok(EnrollmentStats {
            enrollments,
            total,
            total_points,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attenda_db::entities::user::{self, UserRole};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    use crate::services::push::NoOpPush;

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> EventService {
        EventService::new(
            EventRepository::new(Arc::clone(&db)),
            EnrollmentRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            AdminSettingsRepository::new(Arc::clone(&db)),
            Arc::new(NoOpPush),
        )
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

    fn test_enrollment(id: &str, user_id: &str, event_id: &str) -> enrollment::Model {
        enrollment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            status: EnrollmentStatus::Attended,
            claim_point: true,
            reminder_sent: false,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_validate_time() {
        assert!(validate_time("18:30").is_ok());
        assert!(validate_time("7pm").is_err());
        assert!(validate_time("25:99").is_err());
    }

    #[test]
    fn test_create_event_input_validation() {
        let input = CreateEventInput {
            title: String::new(),
            description: "d".to_string(),
            point_value: 10,
            date: Utc::now(),
            time: "18:00".to_string(),
            max_student: 5,
            event_type: None,
        };
        assert!(input.validate().is_err());

        let input = CreateEventInput {
            title: "Meetup".to_string(),
            description: "d".to_string(),
            point_value: -1,
            date: Utc::now(),
            time: "18:00".to_string(),
            max_student: 5,
            event_type: None,
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_update_unknown_event_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.update("missing", UpdateEventInput::default()).await;
        assert!(matches!(result, Err(AppError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn test_upcoming_flags_enrollment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_event("ev1", 10), test_event("ev2", 20)]])
                .append_query_results([[test_enrollment("enr1", "user1", "ev2")]])
                .into_connection(),
        );
        let service = create_service(db);

        let upcoming = service.upcoming("user1").await.unwrap();
        assert_eq!(upcoming.len(), 2);
        assert!(!upcoming[0].enrolled);
        assert!(upcoming[1].enrolled);
    }

    #[tokio::test]
    async fn test_attended_stats_totals() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("user1")]])
                .append_query_results([vec![
                    test_enrollment("enr1", "user1", "ev1"),
                    test_enrollment("enr2", "user1", "ev2"),
                ]])
                .append_query_results([vec![test_event("ev1", 10), test_event("ev2", 20)]])
                .into_connection(),
        );
        let service = create_service(db);

        let stats = service.attended_stats("user1").await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.total_points, 30);
    }
}
