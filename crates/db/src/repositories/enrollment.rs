//! Enrollment repository.

use std::sync::Arc;

use crate::entities::{Enrollment, enrollment};
use attenda_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};

/// Enrollment repository for database operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an enrollment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<enrollment::Model>> {
        Enrollment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an enrollment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<enrollment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::EnrollmentNotFound(id.to_string()))
    }

    /// Find the enrollment for a (user, event) pair.
    pub async fn find_by_user_and_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's enrollments matching a set of IDs.
    pub async fn find_by_ids_for_user(
        &self,
        ids: &[String],
        user_id: &str,
    ) -> AppResult<Vec<enrollment::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Enrollment::find()
            .filter(enrollment::Column::Id.is_in(ids.to_vec()))
            .filter(enrollment::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all enrollments of a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all enrollments of an event.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::EventId.eq(event_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's enrollments in a given status.
    pub async fn find_by_user_and_status(
        &self,
        user_id: &str,
        status: enrollment::EnrollmentStatus,
    ) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::Status.eq(status))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Admin review queue: claimed but still in JOIN, newest first.
    pub async fn find_claimed_pending(&self) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::ClaimPoint.eq(true))
            .filter(enrollment::Column::Status.eq(enrollment::EnrollmentStatus::Join))
            .order_by_desc(enrollment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Enrollments for an event that have not been reminded yet.
    pub async fn find_unreminded_by_event(
        &self,
        event_id: &str,
    ) -> AppResult<Vec<enrollment::Model>> {
        Enrollment::find()
            .filter(enrollment::Column::EventId.eq(event_id))
            .filter(enrollment::Column::ReminderSent.eq(false))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flag enrollments as reminded (single UPDATE query, no fetch).
    pub async fn mark_reminder_sent(&self, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Enrollment::update_many()
            .col_expr(enrollment::Column::ReminderSent, Expr::value(true))
            .filter(enrollment::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
