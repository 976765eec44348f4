//! Registration endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    RegisterRequest, RegisterResponse, RegistrationWithEvent, StudentRegistrationsQuery,
};
use domain::services::{self, RegisterOutcome};
use serde::Serialize;
use shared::normalize_student_id;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminPrincipal, JsonBody};
use crate::middleware::metrics::record_registration;

#[derive(Debug, Serialize)]
pub struct StudentRegistrationsResponse {
    pub student_id: String,
    pub registrations: Vec<RegistrationWithEvent>,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub message: String,
}

/// POST /events/:event_id/register
///
/// 201 with a fresh token, or 409 carrying the pair's existing token.
pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let raw_student_id = request.student_id.unwrap_or_default();
    let outcome =
        services::register(&*state.store, &event_id, &raw_student_id, Utc::now()).await?;
    record_registration(outcome.as_str());

    match outcome {
        RegisterOutcome::Created(registration) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "registered".to_string(),
                token: registration.token,
            }),
        )),
        RegisterOutcome::Conflict {
            existing_token,
            status,
        } => Err(ApiError::RegistrationConflict {
            token: existing_token,
            status,
        }),
    }
}

/// GET /registrations?student_id=
pub async fn list_for_student(
    State(state): State<AppState>,
    Query(query): Query<StudentRegistrationsQuery>,
) -> Result<Json<StudentRegistrationsResponse>, ApiError> {
    let student_id = query
        .student_id
        .as_deref()
        .map(normalize_student_id)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?
        .ok_or_else(|| ApiError::Validation("student_id query parameter is required".into()))?;

    let registrations =
        services::registrations_for_student(&*state.store, student_id.as_str()).await?;
    Ok(Json(StudentRegistrationsResponse {
        student_id: student_id.into_inner(),
        registrations,
    }))
}

/// DELETE /events/:event_id/registrations/:student_id (admin)
pub async fn withdraw(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    Path((event_id, student_id)): Path<(String, String)>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    services::withdraw(&*state.store, &event_id, &student_id).await?;
    tracing::info!(event_id = %event_id, admin = %admin.subject, "Registration withdrawn via API");
    Ok(Json(WithdrawResponse {
        message: "registration withdrawn".to_string(),
    }))
}
