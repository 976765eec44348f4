//! Storage traits consumed by the core services.
//!
//! Correctness under concurrency is delegated to the store: implementations
//! must enforce uniqueness of (event, student) for registrations and
//! attendance, uniqueness of registration tokens, and must make the
//! attendance upsert a single conflict-resolving write. Nothing here caches
//! state between calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::StudentId;
use thiserror::Error;

use crate::models::{
    Attendance, Event, EventPatch, EventSummary, Feedback, ListEventsQuery, NewEvent, NewFeedback,
    NewRegistration, Registration, RegistrationStatus, RegistrationWithEvent,
};

pub mod memory;

pub use memory::InMemoryStore;

/// Errors surfaced by storage adapters.
///
/// Constraint violations the core reasons about are translated into typed
/// variants or outcomes; raw driver errors never cross this boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write referenced an event that does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// An event with this identifier already exists.
    #[error("Event already exists: {0}")]
    DuplicateEvent(String),

    /// A freshly generated registration token collided with an existing one.
    #[error("Registration token collision")]
    DuplicateToken,

    /// A failure that may succeed when retried (deadlock, serialization, timeout).
    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Result of inserting a registration row.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The row was created.
    Inserted(Registration),
    /// A row for the (event, student) pair already exists; nothing was written.
    PairExists,
}

/// Result of the attendance upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(Attendance),
    Updated(Attendance),
}

/// Event persistence.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;

    /// Lists events ordered by start time with their active registration counts.
    async fn list_events(&self, query: &ListEventsQuery) -> Result<Vec<EventSummary>, StoreError>;

    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError>;

    /// Applies a partial update; `None` when the event does not exist.
    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<Event>, StoreError>;

    /// Deletes an event and everything keyed on it; `false` when absent.
    async fn delete_event(&self, event_id: &str) -> Result<bool, StoreError>;
}

/// Registration ledger persistence.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Counts rows for the event with status `registered`, read fresh.
    async fn count_active_registrations(&self, event_id: &str) -> Result<i64, StoreError>;

    /// Inserts a `registered` row unless the pair already has one.
    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<InsertOutcome, StoreError>;

    async fn find_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError>;

    /// Looks up a registration by token, only if its status is `registered`.
    async fn find_active_by_token(&self, token: &str)
        -> Result<Option<Registration>, StoreError>;

    /// Moves the pair's row from `from` to `to`; `false` if no row was in `from`.
    async fn transition_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<bool, StoreError>;

    /// Moves every `registered` row of the event to `cancelled`; returns the
    /// number of rows moved.
    async fn cancel_active_registrations(&self, event_id: &str) -> Result<u64, StoreError>;

    /// All registrations of a student joined with event metadata, newest first.
    async fn list_registrations_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError>;
}

/// Attendance persistence.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Atomically inserts the pair's row as present at `at`, or updates the
    /// existing row's timestamp and reaffirms presence.
    async fn upsert_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError>;

    async fn find_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Attendance>, StoreError>;

    /// Attendance rows for an event, most recent first.
    async fn list_attendance(&self, event_id: &str) -> Result<Vec<Attendance>, StoreError>;
}

/// Feedback persistence.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, StoreError>;
}

/// The full storage surface injected into the HTTP layer.
#[async_trait]
pub trait CampusStore: EventStore + RegistrationStore + AttendanceStore + FeedbackStore {
    /// Round-trips to the backing store for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
