//! Event feedback.

use chrono::{DateTime, Utc};
use shared::normalize_student_id;
use tracing::info;
use validator::Validate;

use super::CoreError;
use crate::models::{Feedback, NewFeedback, SubmitFeedbackRequest};
use crate::store::FeedbackStore;

pub async fn submit_feedback<S>(
    store: &S,
    event_id: &str,
    request: SubmitFeedbackRequest,
    now: DateTime<Utc>,
) -> Result<Feedback, CoreError>
where
    S: FeedbackStore + ?Sized,
{
    let student_id = normalize_student_id(request.student_id.as_deref().unwrap_or_default())?;
    request.validate()?;

    let feedback = store
        .insert_feedback(&NewFeedback {
            event_id: event_id.to_string(),
            student_id,
            rating: request.rating,
            comment: request.comment.filter(|c| !c.trim().is_empty()),
            submitted_at: now,
        })
        .await?;

    info!(event_id, rating = feedback.rating, "Feedback submitted");
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEvent;
    use crate::store::{EventStore, InMemoryStore};
    use serde_json::json;

    fn request(value: serde_json::Value) -> SubmitFeedbackRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_submit_feedback() {
        let store = InMemoryStore::new();
        store
            .insert_event(&NewEvent {
                event_id: "ev1".to_string(),
                title: "Alumni Meet".to_string(),
                event_type: "networking".to_string(),
                description: String::new(),
                starts_at: Utc::now(),
                capacity: None,
                college_id: "c1".to_string(),
                cancelled: false,
                features: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let feedback = submit_feedback(
            &store,
            "ev1",
            request(json!({"student_id": "S1", "rating": 4, "comment": "great"})),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(feedback.student_id.as_str(), "s1");
        assert_eq!(feedback.comment.as_deref(), Some("great"));
    }

    #[tokio::test]
    async fn test_submit_feedback_errors() {
        let store = InMemoryStore::new();

        let missing_event = submit_feedback(
            &store,
            "ev1",
            request(json!({"student_id": "s1", "rating": 4})),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(missing_event, CoreError::EventNotFound));

        let bad_rating = submit_feedback(
            &store,
            "ev1",
            request(json!({"student_id": "s1", "rating": 9})),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(bad_rating, CoreError::InvalidRequest(_)));

        let no_student = submit_feedback(&store, "ev1", request(json!({"rating": 3})), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(no_student, CoreError::InvalidIdentifier(_)));
    }
}
