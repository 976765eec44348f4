//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod attendance;
pub mod event;
pub mod feedback;
pub mod registration;

pub use attendance::{AttendanceEntity, UpsertedAttendanceEntity};
pub use event::{EventEntity, EventSummaryEntity};
pub use feedback::FeedbackEntity;
pub use registration::{RegistrationEntity, RegistrationStatusDb, RegistrationWithEventEntity};
