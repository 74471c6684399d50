//! Enrollment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};

use attenda_common::AppResult;
use attenda_core::ClaimPointsInput;
use attenda_db::entities::{
    enrollment::{self, EnrollmentStatus},
    event,
};

use super::auth::UserResponse;
use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// Enroll the caller into an event.
async fn create_enrollment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<enrollment::Model>> {
    let created = state.enrollment_service.enroll(&user.id, &event_id).await?;

    Ok(ApiResponse::created("Enrollment created successfully", created))
}

/// Status transition request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status (SCANNED | ATTENDED | REJECTED).
    pub status: EnrollmentStatus,
}

/// Transition an enrollment's status, awarding points on ATTENDED (admin).
async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<enrollment::Model>> {
    require_admin(&user)?;

    let updated = state
        .enrollment_service
        .update_status(&enrollment_id, req.status)
        .await?;

    Ok(ApiResponse::ok(
        "Enrollment status updated successfully",
        updated,
    ))
}

/// Claim points for a batch of the caller's enrollments.
async fn claim_points(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ClaimPointsInput>,
) -> AppResult<ApiResponse<Vec<enrollment::Model>>> {
    let updated = state.enrollment_service.claim_points(&user.id, req).await?;

    Ok(ApiResponse::ok(
        "Points claimed successfully for enrollment",
        updated,
    ))
}

/// An entry of the admin claim review queue.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedEnrollmentResponse {
    #[serde(flatten)]
    pub enrollment: enrollment::Model,
    pub user: Option<UserResponse>,
    pub event: Option<event::Model>,
}

/// Claimed enrollments awaiting admin review.
async fn claimed_pending(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ClaimedEnrollmentResponse>>> {
    require_admin(&user)?;

    let rows = state.enrollment_service.claimed_pending().await?;

    let data = rows
        .into_iter()
        .map(|r| ClaimedEnrollmentResponse {
            enrollment: r.enrollment,
            user: r.user.map(Into::into),
            event: r.event,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Claimed enrollments retrieved successfully",
        data,
    ))
}

/// A JOIN enrollment with its event summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedEnrollmentResponse {
    #[serde(flatten)]
    pub enrollment: enrollment::Model,
    pub event: Option<event::Model>,
}

/// The caller's JOIN enrollments.
async fn my_joined(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<JoinedEnrollmentResponse>>> {
    let rows = state.enrollment_service.user_joined(&user.id).await?;

    let data = rows
        .into_iter()
        .map(|r| JoinedEnrollmentResponse {
            enrollment: r.enrollment,
            event: r.event,
        })
        .collect();

    Ok(ApiResponse::ok(
        "User join enrollments retrieved successfully",
        data,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{event_id}", post(create_enrollment))
        .route("/{enrollment_id}/status", put(update_status))
        .route("/claim-points", patch(claim_points))
        .route("/claimed", get(claimed_pending))
        .route("/me/joined", get(my_joined))
}
