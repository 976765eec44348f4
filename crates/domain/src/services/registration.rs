//! Registration ledger: one registration per (event, student) pair.

use chrono::{DateTime, Utc};
use shared::normalize_student_id;
use tracing::{debug, info};

use super::capacity::can_admit;
use super::CoreError;
use crate::models::{
    generate_registration_token, NewRegistration, Registration, RegistrationStatus,
    RegistrationWithEvent,
};
use crate::store::{EventStore, InsertOutcome, RegistrationStore, StoreError};

/// Result of a registration attempt that reached the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// A new registration was recorded.
    Created(Registration),
    /// The pair was already registered; carries the existing token so the
    /// student can recover it.
    Conflict {
        existing_token: String,
        status: RegistrationStatus,
    },
}

impl RegisterOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterOutcome::Created(_) => "created",
            RegisterOutcome::Conflict { .. } => "conflict",
        }
    }
}

impl From<Registration> for RegisterOutcome {
    fn from(existing: Registration) -> Self {
        RegisterOutcome::Conflict {
            existing_token: existing.token,
            status: existing.status,
        }
    }
}

/// Registers a student for an event.
///
/// An existing row for the pair is reported as a conflict before capacity is
/// considered, so a student can always recover their token. Concurrent
/// callers for the same pair are linearized by the store's uniqueness rule;
/// the loser reads back the winner's token.
pub async fn register<S>(
    store: &S,
    event_id: &str,
    raw_student_id: &str,
    now: DateTime<Utc>,
) -> Result<RegisterOutcome, CoreError>
where
    S: EventStore + RegistrationStore + ?Sized,
{
    let student_id = normalize_student_id(raw_student_id)?;

    let event = store
        .find_event(event_id)
        .await?
        .ok_or(CoreError::EventNotFound)?;

    if let Some(existing) = store.find_registration(event_id, &student_id).await? {
        debug!(event_id, student_id = %student_id, "Pair already registered");
        return Ok(existing.into());
    }

    let active = store.count_active_registrations(event_id).await?;
    can_admit(&event, active)?;

    let mut attempts = 0;
    let outcome = loop {
        attempts += 1;
        let candidate = NewRegistration {
            event_id: event_id.to_string(),
            student_id: student_id.clone(),
            token: generate_registration_token(),
            registered_at: now,
        };

        match store.insert_registration(&candidate).await {
            Err(StoreError::DuplicateToken) if attempts < 2 => {
                debug!(event_id, "Registration token collided, regenerating");
                continue;
            }
            other => break other?,
        }
    };

    match outcome {
        InsertOutcome::Inserted(registration) => {
            info!(
                event_id,
                student_id = %registration.student_id,
                reg_id = registration.reg_id,
                "Student registered"
            );
            Ok(RegisterOutcome::Created(registration))
        }
        InsertOutcome::PairExists => store
            .find_registration(event_id, &student_id)
            .await?
            .map(RegisterOutcome::from)
            .ok_or(CoreError::EventNotFound),
    }
}

/// Withdraws an active registration, freeing its capacity slot and
/// invalidating its token.
pub async fn withdraw<S>(
    store: &S,
    event_id: &str,
    raw_student_id: &str,
) -> Result<(), CoreError>
where
    S: RegistrationStore + ?Sized,
{
    let student_id = normalize_student_id(raw_student_id)?;

    let moved = store
        .transition_registration(
            event_id,
            &student_id,
            RegistrationStatus::Registered,
            RegistrationStatus::Withdrawn,
        )
        .await?;

    if !moved {
        return Err(CoreError::RegistrationNotFound);
    }

    info!(event_id, student_id = %student_id, "Registration withdrawn");
    Ok(())
}

/// All registrations of a student, matched case-insensitively, newest first.
pub async fn registrations_for_student<S>(
    store: &S,
    raw_student_id: &str,
) -> Result<Vec<RegistrationWithEvent>, CoreError>
where
    S: RegistrationStore + ?Sized,
{
    let student_id = normalize_student_id(raw_student_id)?;
    Ok(store.list_registrations_for_student(&student_id).await?)
}
