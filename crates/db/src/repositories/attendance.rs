//! Attendance repository.

use std::sync::Arc;

use crate::entities::{Attendance, attendance};
use attenda_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Attendance repository for database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    db: Arc<DatabaseConnection>,
}

impl AttendanceRepository {
    /// Create a new attendance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new attendance record.
    pub async fn create(&self, model: attendance::ActiveModel) -> AppResult<attendance::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's attendance record inside a time window (any status).
    pub async fn find_by_user_in_window(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Option<attendance::Model>> {
        Attendance::find()
            .filter(attendance::Column::UserId.eq(user_id))
            .filter(attendance::Column::CreatedAt.gte(start))
            .filter(attendance::Column::CreatedAt.lte(end))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's PRESENT record inside a time window (approval gating).
    pub async fn find_present_in_window(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Option<attendance::Model>> {
        Attendance::find()
            .filter(attendance::Column::UserId.eq(user_id))
            .filter(attendance::Column::Status.eq(attendance::AttendanceStatus::Present))
            .filter(attendance::Column::CreatedAt.gte(start))
            .filter(attendance::Column::CreatedAt.lte(end))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all records inside a time window, oldest first (admin reporting).
    pub async fn find_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<attendance::Model>> {
        Attendance::find()
            .filter(attendance::Column::CreatedAt.gte(start))
            .filter(attendance::Column::CreatedAt.lte(end))
            .order_by_asc(attendance::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
