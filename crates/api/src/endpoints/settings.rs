//! Settings endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch},
};

use attenda_common::AppResult;
use attenda_core::{
    NotificationSettings, UpdateAdminSettingsInput, UpdateNotificationSettingsInput,
};
use attenda_db::entities::admin_settings;

use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// Read the global admin policy (admin).
async fn get_admin_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<admin_settings::Model>> {
    require_admin(&user)?;

    let settings = state.settings_service.admin_settings().await?;

    Ok(ApiResponse::ok("Admin settings retrieved successfully", settings))
}

/// Patch the global admin policy (admin).
async fn update_admin_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateAdminSettingsInput>,
) -> AppResult<ApiResponse<admin_settings::Model>> {
    require_admin(&user)?;

    let updated = state.settings_service.update_admin_settings(req).await?;

    Ok(ApiResponse::ok("Admin settings updated successfully", updated))
}

/// Read the caller's notification toggles.
async fn get_notification_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<NotificationSettings>> {
    let settings = state.settings_service.notification_settings(&user.id).await?;

    Ok(ApiResponse::ok(
        "Notification settings retrieved successfully",
        settings,
    ))
}

/// Patch the caller's notification toggles.
async fn update_notification_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateNotificationSettingsInput>,
) -> AppResult<ApiResponse<NotificationSettings>> {
    let updated = state
        .settings_service
        .update_notification_settings(&user.id, req)
        .await?;

    Ok(ApiResponse::ok(
        "Notification settings updated successfully",
        updated,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(get_admin_settings))
        .route("/admin", patch(update_admin_settings))
        .route("/notifications", get(get_notification_settings))
        .route("/notifications", patch(update_notification_settings))
}
