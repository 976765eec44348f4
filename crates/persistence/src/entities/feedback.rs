//! Feedback entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the feedback table.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackEntity {
    pub fb_id: i64,
    pub event_id: String,
    pub student_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackEntity {
    pub fn into_domain(self) -> Result<domain::models::Feedback, shared::IdentifierError> {
        Ok(domain::models::Feedback {
            fb_id: self.fb_id,
            event_id: self.event_id,
            student_id: shared::normalize_student_id(&self.student_id)?,
            rating: self.rating,
            comment: self.comment,
            submitted_at: self.submitted_at,
        })
    }
}
