//! Outside event endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};

use attenda_common::AppResult;
use attenda_core::{ApprovalDecision, CreateOutsideEventInput, DecisionOutcome};
use attenda_db::entities::outside_event;

use super::auth::UserResponse;
use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// Propose an outside event.
async fn create_outside_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateOutsideEventInput>,
) -> AppResult<ApiResponse<outside_event::Model>> {
    let created = state.outside_event_service.create(&user.id, req).await?;

    Ok(ApiResponse::created(
        "Outside event created successfully",
        created,
    ))
}

/// A proposal with its owner.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutsideEventWithUserResponse {
    #[serde(flatten)]
    pub event: outside_event::Model,
    pub user: Option<UserResponse>,
}

/// Unapproved proposals awaiting review (admin).
async fn list_unapproved(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OutsideEventWithUserResponse>>> {
    require_admin(&user)?;

    let rows = state.outside_event_service.list_unapproved().await?;

    let data = rows
        .into_iter()
        .map(|r| OutsideEventWithUserResponse {
            event: r.event,
            user: r.user.map(Into::into),
        })
        .collect();

    Ok(ApiResponse::ok(
        "Unapproved outside events retrieved successfully",
        data,
    ))
}

/// Decision request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub event_id: String,
    pub decision: ApprovalDecision,
}

/// Approve or reject a proposal (admin).
async fn decide(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DecideRequest>,
) -> AppResult<ApiResponse<Option<outside_event::Model>>> {
    require_admin(&user)?;

    let outcome = state
        .outside_event_service
        .decide(&req.event_id, req.decision)
        .await?;

    match outcome {
        DecisionOutcome::Approved(event) => Ok(ApiResponse::ok(
            "Outside event approved and points awarded",
            Some(event),
        )),
        DecisionOutcome::Rejected => {
            Ok(ApiResponse::ok("Outside event rejected and deleted", None))
        }
    }
}

/// The caller's approved proposals with totals.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutsideEventSummaryResponse {
    pub events: Vec<outside_event::Model>,
    pub total_count: usize,
    pub total_points: i32,
}

/// The caller's approved outside events with totals.
async fn my_summary(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<OutsideEventSummaryResponse>> {
    let summary = state.outside_event_service.user_summary(&user.id).await?;

    Ok(ApiResponse::ok(
        "Approved outside events retrieved successfully",
        OutsideEventSummaryResponse {
            events: summary.events,
            total_count: summary.total_count,
            total_points: summary.total_points,
        },
    ))
}

/// Delete an unapproved proposal (admin).
async fn delete_unapproved(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&user)?;

    state.outside_event_service.delete_unapproved(&event_id).await?;

    Ok(ApiResponse::ok(
        "Unapproved outside event deleted successfully",
        (),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_outside_event))
        .route("/unapproved", get(list_unapproved))
        .route("/decide", patch(decide))
        .route("/me/summary", get(my_summary))
        .route("/{event_id}", delete(delete_unapproved))
}
