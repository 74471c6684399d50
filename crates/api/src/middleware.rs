//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use attenda_common::{AppError, storage::StorageBackend};
use attenda_core::{
    AttendanceService, AuthService, EnrollmentService, EventService, OutsideEventService,
    SettingsService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub attendance_service: AttendanceService,
    pub event_service: EventService,
    pub outside_event_service: OutsideEventService,
    pub enrollment_service: EnrollmentService,
    pub settings_service: SettingsService,
    pub storage: Arc<dyn StorageBackend>,
}

/// Authentication middleware.
///
/// Resolves a Bearer token to its user and stashes it in the request
/// extensions. A token belonging to a deleted or still-inactive account is
/// rejected outright; a missing or invalid token merely leaves the request
/// unauthenticated so the extractor can 401 on protected routes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e @ AppError::Forbidden(_)) => return e.into_response(),
            Err(e) => {
                tracing::debug!(error = %e, "Token authentication failed");
            }
        }
    }

    next.run(req).await
}
