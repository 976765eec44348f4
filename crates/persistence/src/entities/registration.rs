//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::RegistrationStatus;
use shared::StudentId;
use sqlx::FromRow;

/// Database enum for registration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Registered,
    Cancelled,
    Withdrawn,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(status: RegistrationStatusDb) -> Self {
        match status {
            RegistrationStatusDb::Registered => RegistrationStatus::Registered,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
            RegistrationStatusDb::Withdrawn => RegistrationStatus::Withdrawn,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Registered => RegistrationStatusDb::Registered,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
            RegistrationStatus::Withdrawn => RegistrationStatusDb::Withdrawn,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub reg_id: i64,
    pub event_id: String,
    pub student_id: String,
    pub token: String,
    pub status: RegistrationStatusDb,
    pub registered_at: DateTime<Utc>,
}

/// Registration joined with event columns (left join, so event fields may be null).
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationWithEventEntity {
    pub reg_id: i64,
    pub event_id: String,
    pub token: String,
    pub status: RegistrationStatusDb,
    pub registered_at: DateTime<Utc>,
    pub event_title: Option<String>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub event_capacity: Option<i32>,
}

impl RegistrationEntity {
    /// Converts to the domain model, rejecting rows whose student id is not canonical.
    pub fn into_domain(self) -> Result<domain::models::Registration, shared::IdentifierError> {
        let student_id: StudentId = shared::normalize_student_id(&self.student_id)?;
        Ok(domain::models::Registration {
            reg_id: self.reg_id,
            event_id: self.event_id,
            student_id,
            token: self.token,
            status: self.status.into(),
            registered_at: self.registered_at,
        })
    }
}

impl From<RegistrationWithEventEntity> for domain::models::RegistrationWithEvent {
    fn from(entity: RegistrationWithEventEntity) -> Self {
        Self {
            reg_id: entity.reg_id,
            event_id: entity.event_id,
            token: entity.token,
            status: entity.status.into(),
            registered_at: entity.registered_at,
            event_title: entity.event_title,
            event_starts_at: entity.event_starts_at,
            event_type: entity.event_type,
            event_description: entity.event_description,
            event_capacity: entity.event_capacity,
        }
    }
}
