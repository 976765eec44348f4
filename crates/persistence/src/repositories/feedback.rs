//! Feedback repository for database operations.

use domain::models::NewFeedback;
use sqlx::PgPool;

use crate::entities::FeedbackEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, feedback: &NewFeedback) -> Result<FeedbackEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_feedback");
        let result = sqlx::query_as::<_, FeedbackEntity>(
            r#"
            INSERT INTO feedback (event_id, student_id, rating, comment, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING fb_id, event_id, student_id, rating, comment, submitted_at
            "#,
        )
        .bind(&feedback.event_id)
        .bind(feedback.student_id.as_str())
        .bind(feedback.rating)
        .bind(feedback.comment.as_deref())
        .bind(feedback.submitted_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
