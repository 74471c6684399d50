//! Bootstrap seeding.
//!
//! Run once at startup: creates the configured admin account if no admin
//! exists yet, and makes sure the admin policy singleton row is present.

use chrono::Utc;

use attenda_common::{AppResult, Config};
use attenda_db::{
    entities::user::{self, UserRole},
    repositories::{AdminSettingsRepository, UserRepository},
};
use sea_orm::Set;

use crate::services::auth::hash_password;

/// Seed the bootstrap admin and the policy row.
pub async fn seed_admin(
    user_repo: &UserRepository,
    settings_repo: &AdminSettingsRepository,
    config: &Config,
) -> AppResult<()> {
    settings_repo.ensure_seeded().await?;

    if user_repo.find_admin().await?.is_some() {
        tracing::info!("Admin already exists, skipping seeding");
        return Ok(());
    }

    let password_hash = hash_password(&config.bootstrap.admin_password)?;

    let model = user::ActiveModel {
        id: Set(attenda_common::IdGenerator::new().generate()),
        username: Set(config.bootstrap.admin_username.clone()),
        first_name: Set(config.bootstrap.admin_first_name.clone()),
        last_name: Set(config.bootstrap.admin_last_name.clone()),
        password_hash: Set(password_hash),
        role: Set(UserRole::Admin),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let admin = user_repo.create(model).await?;
    tracing::info!(username = %admin.username, "Default admin created");

    Ok(())
}
