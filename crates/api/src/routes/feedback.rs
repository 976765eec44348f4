//! Feedback endpoint handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{Feedback, SubmitFeedbackRequest};
use domain::services;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::JsonBody;

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub message: String,
    pub feedback: Feedback,
}

/// POST /feedback/:event_id
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    JsonBody(request): JsonBody<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let feedback =
        services::submit_feedback(&*state.store, &event_id, request, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            message: "feedback submitted".to_string(),
            feedback,
        }),
    ))
}
