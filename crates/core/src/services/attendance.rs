//! Attendance service.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use attenda_common::{AppError, AppResult, IdGenerator};
use attenda_db::{
    entities::{
        attendance::{self, AttendanceStatus},
        user,
    },
    repositories::{AttendanceRepository, UserRepository},
};
use sea_orm::Set;

/// The UTC calendar-day window containing `at`:
/// [00:00:00.000, 23:59:59.999].
#[must_use]
pub fn utc_day_window(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    day_window(at.date_naive())
}

/// The UTC window covering a calendar day.
#[must_use]
pub fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::milliseconds(86_400_000 - 1);
    (start, end)
}

/// A check-in record joined with its user for admin reporting.
#[derive(Debug, Clone)]
pub struct AttendanceWithUser {
    /// The attendance record.
    pub attendance: attendance::Model,
    /// The user who checked in, if still present.
    pub user: Option<user::Model>,
}

/// Attendance service for business logic.
#[derive(Clone)]
pub struct AttendanceService {
    attendance_repo: AttendanceRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl AttendanceService {
    /// Create a new attendance service.
    #[must_use]
    pub fn new(attendance_repo: AttendanceRepository, user_repo: UserRepository) -> Self {
        Self {
            attendance_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record today's check-in for a user. At most one per UTC day.
    pub async fn check_in(&self, user_id: &str) -> AppResult<attendance::Model> {
        self.user_repo.get_by_id(user_id).await?;

        let (start, end) = utc_day_window(Utc::now());
        if self
            .attendance_repo
            .find_by_user_in_window(user_id, start, end)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Attendance already recorded for today".to_string(),
            ));
        }

        let model = attendance::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            status: Set(AttendanceStatus::Present),
            created_at: Set(Utc::now().into()),
        };

        self.attendance_repo.create(model).await
    }

    /// List a calendar day's check-ins with user data (admin reporting).
    ///
    /// `date` is `YYYY-MM-DD`.
    pub async fn list_by_date(&self, date: &str) -> AppResult<Vec<AttendanceWithUser>> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            AppError::Validation("Invalid date format. Use YYYY-MM-DD".to_string())
        })?;

        let (start, end) = day_window(day);
        let records = self.attendance_repo.find_in_window(start, end).await?;

        let user_ids: Vec<String> = records.iter().map(|r| r.user_id.clone()).collect();
        let users = self.user_repo.find_by_ids(&user_ids).await?;

        Ok(records
            .into_iter()
            .map(|attendance| {
                let user = users.iter().find(|u| u.id == attendance.user_id).cloned();
                AttendanceWithUser { attendance, user }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> AttendanceService {
        AttendanceService::new(
            AttendanceRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: None,
            password_hash: "x".to_string(),
            role: user::UserRole::User,
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

    #[test]
    fn test_day_window_bounds() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (start, end) = day_window(day);

        assert_eq!(start.to_rfc3339(), "2025-06-15T00:00:00+00:00");
        assert_eq!(end.timestamp_millis() - start.timestamp_millis(), 86_399_999);
        assert_eq!(end.date_naive(), day);
    }

    #[test]
    fn test_utc_day_window_contains_input() {
        let at = Utc::now();
        let (start, end) = utc_day_window(at);
        assert!(start <= at && at <= end);
    }

    #[tokio::test]
    async fn test_check_in_rejects_second_of_day() {
        let user = create_test_user("user1");
        let existing = attendance::Model {
            id: "att1".to_string(),
            user_id: "user1".to_string(),
            status: AttendanceStatus::Present,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = create_service(db);

        let result = service.check_in("user1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_by_date_rejects_garbage() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service.list_by_date("not-a-date").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
