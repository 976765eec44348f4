//! Event feedback domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::StudentId;
use validator::Validate;

/// A submitted feedback entry. Feedback is append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Feedback {
    pub fb_id: i64,
    pub event_id: String,
    pub student_id: StudentId,
    pub rating: i16,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Feedback row to be inserted.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub event_id: String,
    pub student_id: StudentId,
    pub rating: i16,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Request payload for submitting feedback.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitFeedbackRequest {
    #[serde(default)]
    pub student_id: Option<String>,

    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 2000, message = "comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}
