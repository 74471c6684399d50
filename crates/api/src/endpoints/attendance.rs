//! Attendance endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use attenda_common::AppResult;
use attenda_db::entities::attendance;

use crate::{
    extractors::{AuthUser, require_admin},
    middleware::AppState,
    response::ApiResponse,
};

/// Record today's check-in for the caller.
async fn check_in(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<attendance::Model>> {
    let record = state.attendance_service.check_in(&user.id).await?;

    Ok(ApiResponse::created(
        "Attendance recorded successfully",
        record,
    ))
}

/// A check-in with a compact user summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub id: String,
    pub user_id: String,
    pub status: attendance::AttendanceStatus,
    pub created_at: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// List a calendar day's check-ins (admin).
async fn by_date(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<ApiResponse<Vec<AttendanceEntry>>> {
    require_admin(&user)?;

    let records = state.attendance_service.list_by_date(&date).await?;

    let entries = records
        .into_iter()
        .map(|r| AttendanceEntry {
            id: r.attendance.id,
            user_id: r.attendance.user_id,
            status: r.attendance.status,
            created_at: r.attendance.created_at.to_rfc3339(),
            username: r.user.as_ref().map(|u| u.username.clone()),
            first_name: r.user.as_ref().map(|u| u.first_name.clone()),
            last_name: r.user.as_ref().map(|u| u.last_name.clone()),
        })
        .collect();

    Ok(ApiResponse::ok("Attendance retrieved successfully", entries))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/by-date/{date}", get(by_date))
}
