//! Check-in endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    Attendance, AttendanceResponse, MarkAttendanceRequest, MarkOutcome, TokenCheckInRequest,
};
use domain::services::{self, MarkResult};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminPrincipal, JsonBody, OptionalPrincipal};
use crate::middleware::metrics::record_attendance_mark;

#[derive(Debug, Serialize)]
pub struct EventAttendanceResponse {
    pub event_id: String,
    pub attendance: Vec<Attendance>,
}

fn mark_response(result: MarkResult, path: &'static str) -> (StatusCode, Json<AttendanceResponse>) {
    record_attendance_mark(result.outcome.as_str(), path);
    let status = match result.outcome {
        MarkOutcome::Created => StatusCode::CREATED,
        MarkOutcome::Updated => StatusCode::OK,
    };
    (
        status,
        Json(AttendanceResponse::new(result.outcome, &result.attendance)),
    )
}

/// POST /events/:event_id/attendance
///
/// Access follows `policy.direct_attendance`.
pub async fn mark_attendance(
    State(state): State<AppState>,
    OptionalPrincipal(principal): OptionalPrincipal,
    Path(event_id): Path<String>,
    JsonBody(request): JsonBody<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    let policy = state.config.policy.direct_attendance;
    if !policy.permits(principal.as_ref()) {
        return Err(match principal {
            None => ApiError::Unauthorized("Authentication required for check-in".into()),
            Some(_) => ApiError::Forbidden("Check-in requires the admin role".into()),
        });
    }

    let raw_student_id = request.student_id.unwrap_or_default();
    let result =
        services::mark_present(&*state.store, &event_id, &raw_student_id, Utc::now()).await?;
    Ok(mark_response(result, "direct"))
}

/// POST /attendance/token (admin)
pub async fn check_in_by_token(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    JsonBody(request): JsonBody<TokenCheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    let token = request.token.unwrap_or_default();
    let result = services::check_in_by_token(&*state.store, &token, Utc::now()).await?;
    Ok(mark_response(result, "token"))
}

/// GET /events/:event_id/attendance (admin)
pub async fn list_attendance(
    State(state): State<AppState>,
    AdminPrincipal(_admin): AdminPrincipal,
    Path(event_id): Path<String>,
) -> Result<Json<EventAttendanceResponse>, ApiError> {
    let attendance = services::list_attendance(&*state.store, &event_id).await?;
    Ok(Json(EventAttendanceResponse {
        event_id,
        attendance,
    }))
}
