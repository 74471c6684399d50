//! Outside event repository.

use std::sync::Arc;

use crate::entities::{OutsideEvent, outside_event};
use attenda_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Outside event repository for database operations.
#[derive(Clone)]
pub struct OutsideEventRepository {
    db: Arc<DatabaseConnection>,
}

impl OutsideEventRepository {
    /// Create a new outside event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an outside event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<outside_event::Model>> {
        OutsideEvent::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an outside event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<outside_event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Outside event not found".to_string()))
    }

    /// Create a new outside event.
    pub async fn create(&self, model: outside_event::ActiveModel) -> AppResult<outside_event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List unapproved proposals, newest first.
    pub async fn find_unapproved(&self) -> AppResult<Vec<outside_event::Model>> {
        OutsideEvent::find()
            .filter(outside_event::Column::Approved.eq(false))
            .order_by_desc(outside_event::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's approved outside events, newest first.
    pub async fn find_approved_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<outside_event::Model>> {
        OutsideEvent::find()
            .filter(outside_event::Column::UserId.eq(user_id))
            .filter(outside_event::Column::Approved.eq(true))
            .order_by_desc(outside_event::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an outside event by ID.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<u64> {
        let result = OutsideEvent::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
