//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use attenda_common::AppResult;
use attenda_core::{CreateEventInput, UpdateEventInput};
use attenda_db::entities::{enrollment, event};

use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// Create a new event (admin).
async fn create_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    require_admin(&user)?;

    let event = state.event_service.create(req, Some(&user.id)).await?;

    Ok(ApiResponse::created("Event created successfully", event))
}

/// List all events.
async fn list_events(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<event::Model>>> {
    let events = state.event_service.list().await?;

    Ok(ApiResponse::ok("Events retrieved successfully", events))
}

/// An upcoming event flagged with the caller's enrollment state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEventResponse {
    #[serde(flatten)]
    pub event: event::Model,
    pub enrolled: bool,
}

/// Upcoming events with the caller's enrollment flag.
async fn upcoming_events(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UpcomingEventResponse>>> {
    let events = state.event_service.upcoming(&user.id).await?;

    let data = events
        .into_iter()
        .map(|e| UpcomingEventResponse {
            event: e.event,
            enrolled: e.enrolled,
        })
        .collect();

    Ok(ApiResponse::ok("Upcoming events retrieved successfully", data))
}

/// An enrollment with its event, as returned by the stats endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentWithEventResponse {
    #[serde(flatten)]
    pub enrollment: enrollment::Model,
    pub event: Option<event::Model>,
}

/// Stats over a user's enrollments of one status.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatsResponse {
    pub enrollments: Vec<EnrollmentWithEventResponse>,
    pub total: usize,
    pub total_points: i32,
}

impl From<attenda_core::EnrollmentStats> for EnrollmentStatsResponse {
    fn from(stats: attenda_core::EnrollmentStats) -> Self {
        Self {
            enrollments: stats
                .enrollments
                .into_iter()
                .map(|e| EnrollmentWithEventResponse {
                    enrollment: e.enrollment,
                    event: e.event,
                })
                .collect(),
            total: stats.total,
            total_points: stats.total_points,
        }
    }
}

/// The caller's attended events with totals.
async fn my_attended(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<EnrollmentStatsResponse>> {
    let stats = state.event_service.attended_stats(&user.id).await?;

    Ok(ApiResponse::ok(
        "Attended events retrieved successfully",
        stats.into(),
    ))
}

/// The caller's joined events with totals.
async fn my_joined(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<EnrollmentStatsResponse>> {
    let stats = state.event_service.joined_stats(&user.id).await?;

    Ok(ApiResponse::ok(
        "Joined events retrieved successfully",
        stats.into(),
    ))
}

/// An event with its roster.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithEnrollmentsResponse {
    #[serde(flatten)]
    pub event: event::Model,
    pub enrollments: Vec<enrollment::Model>,
}

/// Get one event with its enrollments.
async fn get_event(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<EventWithEnrollmentsResponse>> {
    let found = state.event_service.get(&event_id).await?;

    Ok(ApiResponse::ok(
        "Event retrieved successfully",
        EventWithEnrollmentsResponse {
            event: found.event,
            enrollments: found.enrollments,
        },
    ))
}

/// Update an event (admin).
async fn update_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<UpdateEventInput>,
) -> AppResult<ApiResponse<event::Model>> {
    require_admin(&user)?;

    let updated = state.event_service.update(&event_id, req).await?;

    Ok(ApiResponse::ok("Event updated successfully", updated))
}

/// Delete an event (admin).
async fn delete_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<event::Model>> {
    require_admin(&user)?;

    let deleted = state.event_service.delete(&event_id).await?;

    Ok(ApiResponse::ok("Event deleted successfully", deleted))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route("/", get(list_events))
        .route("/upcoming", get(upcoming_events))
        .route("/me/attended", get(my_attended))
        .route("/me/joined", get(my_joined))
        .route("/{event_id}", get(get_event))
        .route("/{event_id}", patch(update_event))
        .route("/{event_id}", delete(delete_event))
}
