//! Settings service.
//!
//! Global admin policy (the singleton row) and per-user notification
//! toggles.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use attenda_common::{AppError, AppResult};
use attenda_db::{
    entities::{admin_settings, user},
    repositories::{AdminSettingsRepository, UserRepository},
};
use sea_orm::Set;

/// Partial update of the global admin policy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminSettingsInput {
    pub auto_approve_point: Option<bool>,
    pub allow_custom_point: Option<bool>,
    pub create_event_notify: Option<bool>,
    pub event_reminders: Option<bool>,
}

impl UpdateAdminSettingsInput {
    const fn is_empty(&self) -> bool {
        self.auto_approve_point.is_none()
            && self.allow_custom_point.is_none()
            && self.create_event_notify.is_none()
            && self.event_reminders.is_none()
    }
}

/// Partial update of a user's notification toggles.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationSettingsInput {
    pub is_event_approve_notify: Option<bool>,
    pub is_new_event_notify: Option<bool>,
    pub is_event_reminder: Option<bool>,
}

impl UpdateNotificationSettingsInput {
    const fn is_empty(&self) -> bool {
        self.is_event_approve_notify.is_none()
            && self.is_new_event_notify.is_none()
            && self.is_event_reminder.is_none()
    }
}

/// A user's notification toggles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub is_event_approve_notify: bool,
    pub is_new_event_notify: bool,
    pub is_event_reminder: bool,
}

impl From<&user::Model> for NotificationSettings {
    fn from(user: &user::Model) -> Self {
        Self {
            is_event_approve_notify: user.is_event_approve_notify,
            is_new_event_notify: user.is_new_event_notify,
            is_event_reminder: user.is_event_reminder,
        }
    }
}

/// Settings service for business logic.
#[derive(Clone)]
pub struct SettingsService {
    settings_repo: AdminSettingsRepository,
    user_repo: UserRepository,
}

impl SettingsService {
    /// Create a new settings service.
    #[must_use]
    pub const fn new(settings_repo: AdminSettingsRepository, user_repo: UserRepository) -> Self {
        Self {
            settings_repo,
            user_repo,
        }
    }

    /// Read the global admin policy.
    pub async fn admin_settings(&self) -> AppResult<admin_settings::Model> {
        self.settings_repo.get().await
    }

    /// Patch the global admin policy.
    pub async fn update_admin_settings(
        &self,
        input: UpdateAdminSettingsInput,
    ) -> AppResult<admin_settings::Model> {
        if input.is_empty() {
            return Err(AppError::BadRequest(
                "No valid fields provided for update".to_string(),
            ));
        }

        // The row may be missing on a fresh database
        self.settings_repo.ensure_seeded().await?;

        let mut active = admin_settings::ActiveModel {
            id: Set(admin_settings::SINGLETON_ID.to_string()),
            ..Default::default()
        };

        if let Some(auto_approve_point) = input.auto_approve_point {
            active.auto_approve_point = Set(auto_approve_point);
        }
        if let Some(allow_custom_point) = input.allow_custom_point {
            active.allow_custom_point = Set(allow_custom_point);
        }
        if let Some(create_event_notify) = input.create_event_notify {
            active.create_event_notify = Set(create_event_notify);
        }
        if let Some(event_reminders) = input.event_reminders {
            active.event_reminders = Set(event_reminders);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.settings_repo.update(active).await
    }

    /// Read a user's notification toggles.
    pub async fn notification_settings(&self, user_id: &str) -> AppResult<NotificationSettings> {
        let user = self.user_repo.get_by_id(user_id).await?;
        Ok(NotificationSettings::from(&user))
    }

    /// Patch a user's notification toggles.
    pub async fn update_notification_settings(
        &self,
        user_id: &str,
        input: UpdateNotificationSettingsInput,
    ) -> AppResult<NotificationSettings> {
        if input.is_empty() {
            return Err(AppError::BadRequest(
                "No valid fields provided for update".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(value) = input.is_event_approve_notify {
            active.is_event_approve_notify = Set(value);
        }
        if let Some(value) = input.is_new_event_notify {
            active.is_new_event_notify = Set(value);
        }
        if let Some(value) = input.is_event_reminder {
            active.is_event_reminder = Set(value);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        Ok(NotificationSettings::from(&updated))
    }

    /// Store (or replace) a user's push device token.
    pub async fn register_device_token(
        &self,
        user_id: &str,
        token: Option<String>,
    ) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.fcm_token = Set(token);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_service(db: Arc<sea_orm::DatabaseConnection>) -> SettingsService {
        SettingsService::new(
            AdminSettingsRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_admin_settings_fall_back_to_defaults() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<admin_settings::Model>::new()])
                .into_connection(),
        );
        let service = create_service(db);

        let settings = service.admin_settings().await.unwrap();
        assert!(settings.auto_approve_point);
        assert!(settings.allow_custom_point);
    }

    #[tokio::test]
    async fn test_empty_admin_patch_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .update_admin_settings(UpdateAdminSettingsInput::default())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_empty_notification_patch_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_service(db);

        let result = service
            .update_notification_settings("user1", UpdateNotificationSettingsInput::default())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
