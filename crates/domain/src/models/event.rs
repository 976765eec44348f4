//! Event domain model.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use shared::identifier::validate_event_id;
use validator::Validate;

/// Prefix used for server-assigned event identifiers.
pub const EVENT_ID_PREFIX: &str = "ev";

/// College assigned to events created without one.
pub const DEFAULT_COLLEGE_ID: &str = "c1";

/// A campus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub event_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    /// Upper bound on active registrations; `None` means unlimited.
    pub capacity: Option<i32>,
    pub college_id: String,
    pub cancelled: bool,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event carries the given feature tag (case-insensitive).
    pub fn has_feature(&self, feature: &str) -> bool {
        let wanted = feature.trim().to_lowercase();
        self.features.iter().any(|f| *f == wanted)
    }
}

/// Event listing row with its live count of active registrations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub registered_count: i64,
}

/// Feature tags as accepted on the wire: either a list or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeaturesInput {
    List(Vec<String>),
    Csv(String),
}

impl FeaturesInput {
    /// Returns trimmed, lower-cased, de-duplicated tags in input order.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            FeaturesInput::List(items) => items.iter().map(String::as_str).collect(),
            FeaturesInput::Csv(csv) => csv.split(',').collect(),
        };

        let mut out: Vec<String> = Vec::new();
        for tag in raw {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !out.contains(&tag) {
                out.push(tag);
            }
        }
        out
    }
}

/// Request payload for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    #[validate(custom(function = "validate_event_id"))]
    pub event_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "type must be 1-50 characters"))]
    pub event_type: String,

    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub starts_at: DateTime<Utc>,

    #[validate(range(min = 0, message = "capacity must not be negative"))]
    pub capacity: Option<i32>,

    #[validate(length(min = 1, max = 50, message = "college_id must be 1-50 characters"))]
    pub college_id: Option<String>,

    #[serde(default, alias = "cancelled_flag")]
    pub cancelled: bool,

    pub features: Option<FeaturesInput>,
}

/// Normalized event ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEvent {
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

impl CreateEventRequest {
    /// Converts a validated request into a [`NewEvent`], assigning an id when absent.
    pub fn into_new_event(self, now: DateTime<Utc>) -> NewEvent {
        let event_id = match self.event_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => generate_event_id(),
        };

        NewEvent {
            event_id,
            title: self.title.trim().to_string(),
            event_type: self.event_type.trim().to_string(),
            description: self.description.unwrap_or_default(),
            starts_at: self.starts_at,
            capacity: self.capacity,
            college_id: self
                .college_id
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| DEFAULT_COLLEGE_ID.to_string()),
            cancelled: self.cancelled,
            features: self.features.map(|f| f.normalize()).unwrap_or_default(),
            created_at: now,
        }
    }
}

/// Request payload for a partial event update.
///
/// `capacity` distinguishes "absent" (`None`) from "explicitly null"
/// (`Some(None)`, removing the limit).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "type must be 1-50 characters"))]
    pub event_type: Option<String>,

    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    pub capacity: Option<Option<i32>>,

    #[validate(length(min = 1, max = 50, message = "college_id must be 1-50 characters"))]
    pub college_id: Option<String>,

    #[serde(alias = "cancelled_flag")]
    pub cancelled: Option<bool>,

    pub features: Option<FeaturesInput>,
}

/// Normalized partial update applied by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub capacity: Option<Option<i32>>,
    pub college_id: Option<String>,
    pub cancelled: Option<bool>,
    pub features: Option<Vec<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Applies the patch to an in-memory event.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(event_type) = &self.event_type {
            event.event_type = event_type.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(starts_at) = self.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
        if let Some(college_id) = &self.college_id {
            event.college_id = college_id.clone();
        }
        if let Some(cancelled) = self.cancelled {
            event.cancelled = cancelled;
        }
        if let Some(features) = &self.features {
            event.features = features.clone();
        }
    }
}

impl UpdateEventRequest {
    /// Checks the fields `validator` cannot express.
    pub fn check_capacity(&self) -> Result<(), String> {
        match self.capacity {
            Some(Some(c)) if c < 0 => Err("capacity must not be negative".to_string()),
            _ => Ok(()),
        }
    }

    pub fn into_patch(self) -> EventPatch {
        EventPatch {
            title: self.title.map(|t| t.trim().to_string()),
            event_type: self.event_type.map(|t| t.trim().to_string()),
            description: self.description,
            starts_at: self.starts_at,
            capacity: self.capacity,
            college_id: self.college_id.map(|c| c.trim().to_string()),
            cancelled: self.cancelled,
            features: self.features.map(|f| f.normalize()),
        }
    }
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEventsQuery {
    pub college_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Case-insensitive feature tag.
    pub feature: Option<String>,
}

impl ListEventsQuery {
    /// Whether an event passes every filter of this query.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(college_id) = &self.college_id {
            if &event.college_id != college_id {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &event.event_type != event_type {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !event.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(feature) = &self.feature {
            if !event.has_feature(feature) {
                return false;
            }
        }
        true
    }
}

/// Generates a server-assigned event id (`ev` + 8 hex characters).
pub fn generate_event_id() -> String {
    let value: u32 = rand::thread_rng().gen();
    format!("{}{:08x}", EVENT_ID_PREFIX, value)
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
