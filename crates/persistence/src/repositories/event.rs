//! Event repository for database operations.

use domain::models::{EventPatch, ListEventsQuery, NewEvent};
use sqlx::PgPool;

use crate::entities::{EventEntity, EventSummaryEntity};
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "event_id, title, event_type, description, starts_at, capacity, \
                             college_id, cancelled, features, created_at";

/// Repository for event database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, event_id: &str) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {} FROM events WHERE event_id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists events matching the query, each with its active registration count.
    pub async fn list(
        &self,
        query: &ListEventsQuery,
    ) -> Result<Vec<EventSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let result = sqlx::query_as::<_, EventSummaryEntity>(
            r#"
            SELECT e.event_id, e.title, e.event_type, e.description, e.starts_at, e.capacity,
                   e.college_id, e.cancelled, e.features, e.created_at,
                   COUNT(r.reg_id) FILTER (WHERE r.status = 'registered') AS registered_count
            FROM events e
            LEFT JOIN registrations r ON r.event_id = e.event_id
            WHERE ($1::TEXT IS NULL OR e.college_id = $1)
              AND ($2::TEXT IS NULL OR e.event_type = $2)
              AND ($3::TEXT IS NULL OR POSITION(LOWER($3) IN LOWER(e.title)) > 0)
              AND ($4::TEXT IS NULL OR LOWER(TRIM($4)) = ANY(e.features))
            GROUP BY e.event_id
            ORDER BY e.starts_at, e.event_id
            "#,
        )
        .bind(query.college_id.as_deref())
        .bind(query.event_type.as_deref())
        .bind(query.search.as_deref())
        .bind(query.feature.as_deref())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn insert(&self, event: &NewEvent) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (event_id, title, event_type, description, starts_at, capacity,
                                college_id, cancelled, features, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&event.event_id)
        .bind(&event.title)
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(event.starts_at)
        .bind(event.capacity)
        .bind(&event.college_id)
        .bind(event.cancelled)
        .bind(&event.features)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Applies a partial update; absent fields keep their stored value.
    pub async fn update(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                event_type = COALESCE($3, event_type),
                description = COALESCE($4, description),
                starts_at = COALESCE($5, starts_at),
                capacity = CASE WHEN $6 THEN $7 ELSE capacity END,
                college_id = COALESCE($8, college_id),
                cancelled = COALESCE($9, cancelled),
                features = COALESCE($10, features)
            WHERE event_id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .bind(patch.title.as_deref())
        .bind(patch.event_type.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.starts_at)
        .bind(patch.capacity.is_some())
        .bind(patch.capacity.flatten())
        .bind(patch.college_id.as_deref())
        .bind(patch.cancelled)
        .bind(patch.features.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes an event; registrations, attendance and feedback cascade.
    pub async fn delete(&self, event_id: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
