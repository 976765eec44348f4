//! Core services for campus events.
//!
//! Services hold the business rules and operate on the store traits, so the
//! same code runs against Postgres and the in-memory store. Each takes the
//! current time explicitly where it stamps rows.

pub mod attendance;
pub mod capacity;
pub mod checkin;
pub mod error;
pub mod events;
pub mod feedback;
pub mod registration;

pub use attendance::{list_attendance, mark_present, MarkResult};
pub use capacity::{can_admit, AdmissionError};
pub use checkin::{check_in_by_token, resolve_token};
pub use error::CoreError;
pub use events::{create_event, delete_event, get_event, list_events, update_event};
pub use feedback::submit_feedback;
pub use registration::{register, registrations_for_student, withdraw, RegisterOutcome};
