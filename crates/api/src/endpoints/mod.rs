//! API endpoints.

mod attendance;
mod auth;
mod enrollments;
mod events;
mod outside_events;
mod settings;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/attendance", attendance::router())
        .nest("/events", events::router())
        .nest("/outside-events", outside_events::router())
        .nest("/enrollments", enrollments::router())
        .nest("/settings", settings::router())
}
