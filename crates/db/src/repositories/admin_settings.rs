//! Admin settings repository.
//!
//! The policy switches live in a single row keyed by
//! [`admin_settings::SINGLETON_ID`]. Reads fall back to defaults so the
//! workflow never blocks on a missing row.

use std::sync::Arc;

use crate::entities::{AdminSettings, admin_settings};
use attenda_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Admin settings repository for database operations.
#[derive(Clone)]
pub struct AdminSettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminSettingsRepository {
    /// Create a new admin settings repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Read the singleton policy row, falling back to defaults.
    pub async fn get(&self) -> AppResult<admin_settings::Model> {
        let row = AdminSettings::find_by_id(admin_settings::SINGLETON_ID)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.unwrap_or_else(admin_settings::Model::defaults))
    }

    /// Insert the singleton row with defaults if it does not exist yet.
    pub async fn ensure_seeded(&self) -> AppResult<admin_settings::Model> {
        if let Some(existing) = AdminSettings::find_by_id(admin_settings::SINGLETON_ID)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            return Ok(existing);
        }

        let defaults = admin_settings::Model::defaults();
        let model = admin_settings::ActiveModel {
            id: Set(defaults.id.clone()),
            auto_approve_point: Set(defaults.auto_approve_point),
            allow_custom_point: Set(defaults.allow_custom_point),
            create_event_notify: Set(defaults.create_event_notify),
            event_reminders: Set(defaults.event_reminders),
            updated_at: Set(None),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update the singleton policy row.
    pub async fn update(
        &self,
        model: admin_settings::ActiveModel,
    ) -> AppResult<admin_settings::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
