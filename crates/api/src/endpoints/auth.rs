//! Authentication and account endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{patch, post},
};
use serde::{Deserialize, Serialize};

use attenda_common::{AppError, AppResult, generate_storage_key};
use attenda_core::{ChangePasswordInput, RegisterInput, TokenPair, UpdateProfileInput};
use attenda_db::entities::user;

use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// A user as returned by the API. Omits the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: user::UserRole,
    pub is_active: bool,
    pub point: i32,
    pub fcm_token: Option<String>,
    pub image_url: Option<String>,
    pub is_event_approve_notify: bool,
    pub is_new_event_notify: bool,
    pub is_event_reminder: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            point: user.point,
            fcm_token: user.fcm_token,
            image_url: user.image_url,
            is_event_approve_notify: user.is_event_approve_notify,
            is_new_event_notify: user.is_new_event_notify,
            is_event_reminder: user.is_event_reminder,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// A user together with a fresh token pair.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    fn new(user: user::Model, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let (user, tokens) = state.auth_service.register(req).await?;

    Ok(ApiResponse::created(
        "User registered successfully",
        AuthResponse::new(user, tokens),
    ))
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Sign in with username and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let (user, tokens) = state.auth_service.login(&req.username, &req.password).await?;

    Ok(ApiResponse::ok(
        "Logged in successfully",
        AuthResponse::new(user, tokens),
    ))
}

/// Refresh token request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Exchange a refresh token for a new pair.
async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(ApiResponse::ok("Token refreshed successfully", tokens))
}

/// Change the caller's password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordInput>,
) -> AppResult<ApiResponse<()>> {
    state.auth_service.change_password(&user.id, req).await?;

    Ok(ApiResponse::ok("Password changed successfully", ()))
}

/// Activate a registered account (admin).
async fn activate_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&user)?;

    let activated = state.auth_service.activate_account(&user_id).await?;

    Ok(ApiResponse::ok(
        "Account activated successfully",
        activated.into(),
    ))
}

/// Update the caller's profile. Multipart: optional `firstName`,
/// `lastName` text fields and an optional `image` file uploaded through
/// the storage backend.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut input = UpdateProfileInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        match field.name() {
            Some("firstName") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid field: {e}")))?;
                input.first_name = Some(value);
            }
            Some("lastName") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid field: {e}")))?;
                input.last_name = Some(value);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file: {e}")))?;

                let key = generate_storage_key(&user.id, &file_name);
                let uploaded = state.storage.upload(&key, &data, &content_type).await?;
                input.image_url = Some(uploaded.url);
            }
            _ => {}
        }
    }

    let updated = state.auth_service.update_profile(&user.id, input).await?;

    Ok(ApiResponse::ok("Profile updated successfully", updated.into()))
}

/// Device token request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokenRequest {
    /// New device token; null clears it.
    pub fcm_token: Option<String>,
}

/// Store the caller's push device token.
async fn update_device_token(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeviceTokenRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .settings_service
        .register_device_token(&user.id, req.fcm_token)
        .await?;

    Ok(ApiResponse::ok("Device token updated successfully", ()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", patch(change_password))
        .route("/activate/{user_id}", patch(activate_account))
        .route("/profile", patch(update_profile))
        .route("/device-token", patch(update_device_token))
}
