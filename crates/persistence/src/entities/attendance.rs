//! Attendance entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the attendance table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceEntity {
    pub att_id: i64,
    pub event_id: String,
    pub student_id: String,
    pub present: bool,
    pub attended_at: DateTime<Utc>,
}

/// Attendance row returned by the native upsert, with whether it was inserted.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedAttendanceEntity {
    #[sqlx(flatten)]
    pub attendance: AttendanceEntity,
    pub inserted: bool,
}

impl AttendanceEntity {
    pub fn into_domain(self) -> Result<domain::models::Attendance, shared::IdentifierError> {
        Ok(domain::models::Attendance {
            att_id: self.att_id,
            event_id: self.event_id,
            student_id: shared::normalize_student_id(&self.student_id)?,
            present: self.present,
            attended_at: self.attended_at,
        })
    }
}
