//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub event_id: String,
    pub title: String,
    pub event_type: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub college_id: String,
    pub cancelled: bool,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Event row with its count of active registrations.
#[derive(Debug, Clone, FromRow)]
pub struct EventSummaryEntity {
    #[sqlx(flatten)]
    pub event: EventEntity,
    pub registered_count: i64,
}

impl From<EventEntity> for domain::models::Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            event_id: entity.event_id,
            title: entity.title,
            event_type: entity.event_type,
            description: entity.description,
            starts_at: entity.starts_at,
            capacity: entity.capacity,
            college_id: entity.college_id,
            cancelled: entity.cancelled,
            features: entity.features,
            created_at: entity.created_at,
        }
    }
}

impl From<EventSummaryEntity> for domain::models::EventSummary {
    fn from(entity: EventSummaryEntity) -> Self {
        Self {
            event: entity.event.into(),
            registered_count: entity.registered_count,
        }
    }
}
