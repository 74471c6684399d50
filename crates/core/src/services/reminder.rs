//! Event reminder sweep.
//!
//! A periodic job that notifies enrolled users roughly a day before their
//! event starts. Each (event, user) pair is reminded at most once: the
//! enrollment's `reminder_sent` flag is checked before dispatch and set
//! after it. Tokens the provider reports as dead are cleared from the user
//! rows.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use attenda_common::AppResult;
use attenda_db::{
    entities::{enrollment, event, user},
    repositories::{
        AdminSettingsRepository, EnrollmentRepository, EventRepository, UserRepository,
    },
};

use crate::services::push::PushService;

/// Lower bound of the lookahead window, in hours.
const WINDOW_START_HOURS: i64 = 23;
/// Upper bound of the lookahead window, in hours.
const WINDOW_END_HOURS: i64 = 25;

/// The exact start instant of an event: its date combined with its "HH:MM"
/// start time. `None` if the time string is malformed.
#[must_use]
pub fn event_start_at(event: &event::Model) -> Option<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(&event.time, "%H:%M").ok()?;
    Some(
        event
            .date
            .with_timezone(&Utc)
            .date_naive()
            .and_time(time)
            .and_utc(),
    )
}

/// Whether a start instant falls inside the reminder window from `now`.
#[must_use]
pub fn is_due(start_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let until = start_at - now;
    until >= Duration::hours(WINDOW_START_HOURS) && until <= Duration::hours(WINDOW_END_HOURS)
}

/// Keep only tokens of users who should receive a reminder: active,
/// not deleted, opted in, and holding a non-blank token.
#[must_use]
pub fn eligible_tokens(users: &[user::Model]) -> Vec<String> {
    users
        .iter()
        .filter(|u| u.is_event_reminder && u.is_active && !u.is_deleted)
        .filter_map(|u| u.fcm_token.as_deref())
        .filter(|t| !t.trim().is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reminder service driven by the background scheduler.
#[derive(Clone)]
pub struct ReminderService {
    event_repo: EventRepository,
    enrollment_repo: EnrollmentRepository,
    user_repo: UserRepository,
    settings_repo: AdminSettingsRepository,
    push: PushService,
}

impl ReminderService {
    /// Create a new reminder service.
    #[must_use]
    pub const fn new(
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
        }
    }

    /// Run one sweep. Returns the number of events reminded.
    ///
    /// Per-event failures are logged and do not abort the sweep; the push
    /// dispatcher isolates per-token failures within a batch.
    pub async fn run_sweep(&self) -> AppResult<u64> {
        let settings = self.settings_repo.get().await?;
        if !settings.event_reminders {
            tracing::debug!("Reminder sweep disabled by admin policy");
            return Ok(0);
        }

        let now = Utc::now();
        let start = now + Duration::hours(WINDOW_START_HOURS);
        let end = now + Duration::hours(WINDOW_END_HOURS);

        let events = self.event_repo.find_in_window(start, end).await?;
        if events.is_empty() {
            tracing::debug!("No upcoming events in reminder window");
            return Ok(0);
        }

        let mut reminded = 0;
        for event in events {
            match self.remind_event(&event, now).await {
                Ok(true) => reminded += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(event_id = %event.id, error = %e, "Reminder failed for event");
                }
            }
        }

        Ok(reminded)
    }

    /// Remind one event's unreminded enrollees. Returns whether anything
    /// was sent.
    async fn remind_event(&self, event: &event::Model, now: DateTime<Utc>) -> AppResult<bool> {
        // Refine the date-window match against the exact start time
        let Some(start_at) = event_start_at(event) else {
            tracing::warn!(event_id = %event.id, time = %event.time, "Unparseable event time");
            return Ok(false);
        };
        if !is_due(start_at, now) {
            return Ok(false);
        }

        let enrollments = self.enrollment_repo.find_unreminded_by_event(&event.id).await?;
        if enrollments.is_empty() {
            return Ok(false);
        }

        let user_ids: Vec<String> = enrollments.iter().map(|e| e.user_id.clone()).collect();
        let users = self.user_repo.find_by_ids(&user_ids).await?;
        let tokens = eligible_tokens(&users);
        if tokens.is_empty() {
            return Ok(false);
        }

        let body = format!(
            "Your event \"{}\" starts tomorrow at {}! Don't miss it.",
            event.title, event.time
        );
        let data = serde_json::json!({
            "eventType": "event_reminder",
            "eventId": event.id,
        });

        let outcome = self
            .push
            .send_bulk_push(&tokens, "Event Reminder", &body, Some(data))
            .await?;

        tracing::info!(
            event_id = %event.id,
            success = outcome.success_count,
            failed = outcome.failed_tokens.len(),
            "Event reminders dispatched"
        );

        if !outcome.failed_tokens.is_empty() {
            let cleared = self.user_repo.clear_fcm_tokens(&outcome.failed_tokens).await?;
            tracing::info!(cleared, "Cleared invalid device tokens");
        }

        // Flag every enrollment whose user was targeted so the next sweep
        // skips them
        let notified_ids = notified_enrollment_ids(&enrollments, &users);
        self.enrollment_repo.mark_reminder_sent(&notified_ids).await?;

        Ok(true)
    }
}

/// Enrollment IDs whose users were eligible for the dispatched batch.
fn notified_enrollment_ids(
    enrollments: &[enrollment::Model],
    users: &[user::Model],
) -> Vec<String> {
    let eligible: std::collections::HashSet<&str> = users
        .iter()
        .filter(|u| u.is_event_reminder && u.is_active && !u.is_deleted)
        .filter(|u| u.fcm_token.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .map(|u| u.id.as_str())
        .collect();

    enrollments
        .iter()
        .filter(|e| eligible.contains(e.user_id.as_str()))
        .map(|e| e.id.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attenda_db::entities::event::EventType;
    use attenda_db::entities::user::UserRole;

    fn test_event(date: DateTime<Utc>, time: &str) -> event::Model {
        event::Model {
            id: "ev1".to_string(),
            title: "Weekly meetup".to_string(),
            description: "desc".to_string(),
            point_value: 10,
            date: date.into(),
            time: time.to_string(),
            max_student: 10,
            student_enrolled: 0,
            event_type: EventType::Inside,
            created_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_user(id: &str, token: Option<&str>) -> user::Model {
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
            fcm_token: token.map(ToString::to_string),
            image_url: None,
            is_event_approve_notify: true,
            is_new_event_notify: true,
            is_event_reminder: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_event_start_at_combines_date_and_time() {
        let date = "2025-06-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let event = test_event(date, "18:30");

        let start = event_start_at(&event).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-06-15T18:30:00+00:00");
    }

    #[test]
    fn test_event_start_at_rejects_garbage_time() {
        let event = test_event(Utc::now(), "6pm");
        assert!(event_start_at(&event).is_none());
    }

    #[test]
    fn test_is_due_window() {
        let now = Utc::now();
        assert!(is_due(now + Duration::hours(24), now));
        assert!(is_due(now + Duration::hours(23), now));
        assert!(is_due(now + Duration::hours(25), now));
        assert!(!is_due(now + Duration::hours(22), now));
        assert!(!is_due(now + Duration::hours(26), now));
        assert!(!is_due(now - Duration::hours(24), now));
    }

    #[test]
    fn test_eligible_tokens_filters_opt_outs() {
        let mut opted_out = test_user("u2", Some("token-2"));
        opted_out.is_event_reminder = false;
        let mut deleted = test_user("u3", Some("token-3"));
        deleted.is_deleted = true;
        let mut inactive = test_user("u4", Some("token-4"));
        inactive.is_active = false;

        let users = vec![
            test_user("u1", Some("token-1")),
            opted_out,
            deleted,
            inactive,
            test_user("u5", None),
            test_user("u6", Some("   ")),
        ];

        let tokens = eligible_tokens(&users);
        assert_eq!(tokens, vec!["token-1".to_string()]);
    }

    #[test]
    fn test_notified_ids_follow_eligibility() {
        let users = vec![test_user("u1", Some("token-1")), test_user("u2", None)];
        let enrollments = vec![
            enrollment::Model {
                id: "enr1".to_string(),
                user_id: "u1".to_string(),
                event_id: "ev1".to_string(),
                status: enrollment::EnrollmentStatus::Join,
                claim_point: false,
                reminder_sent: false,
                created_at: Utc::now().into(),
            },
            enrollment::Model {
                id: "enr2".to_string(),
                user_id: "u2".to_string(),
                event_id: "ev1".to_string(),
                status: enrollment::EnrollmentStatus::Join,
                claim_point: false,
                reminder_sent: false,
                created_at: Utc::now().into(),
            },
        ];

        let ids = notified_enrollment_ids(&enrollments, &users);
        assert_eq!(ids, vec!["enr1".to_string()]);
    }
}
