//! Attendance marking: one row per (event, student), re-markable.

use chrono::{DateTime, Utc};
use shared::{normalize_student_id, StudentId};
use tracing::info;

use super::CoreError;
use crate::models::{Attendance, MarkOutcome};
use crate::store::{AttendanceStore, EventStore, UpsertOutcome};

/// Outcome of a check-in together with the row as it now stands.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkResult {
    pub outcome: MarkOutcome,
    pub attendance: Attendance,
}

impl From<UpsertOutcome> for MarkResult {
    fn from(upsert: UpsertOutcome) -> Self {
        match upsert {
            UpsertOutcome::Created(attendance) => MarkResult {
                outcome: MarkOutcome::Created,
                attendance,
            },
            UpsertOutcome::Updated(attendance) => MarkResult {
                outcome: MarkOutcome::Updated,
                attendance,
            },
        }
    }
}

/// Marks a student present at an event as of `now`.
///
/// Registration is not required. Repeated calls keep a single row whose
/// `attended_at` is the latest call's timestamp.
pub async fn mark_present<S>(
    store: &S,
    event_id: &str,
    raw_student_id: &str,
    now: DateTime<Utc>,
) -> Result<MarkResult, CoreError>
where
    S: AttendanceStore + ?Sized,
{
    let student_id = normalize_student_id(raw_student_id)?;
    mark_normalized(store, event_id, &student_id, now).await
}

pub(crate) async fn mark_normalized<S>(
    store: &S,
    event_id: &str,
    student_id: &StudentId,
    now: DateTime<Utc>,
) -> Result<MarkResult, CoreError>
where
    S: AttendanceStore + ?Sized,
{
    let result = MarkResult::from(store.upsert_attendance(event_id, student_id, now).await?);

    info!(
        event_id,
        student_id = %student_id,
        outcome = result.outcome.as_str(),
        "Attendance marked"
    );
    Ok(result)
}

/// Attendance rows of an existing event, most recent first.
pub async fn list_attendance<S>(store: &S, event_id: &str) -> Result<Vec<Attendance>, CoreError>
where
    S: EventStore + AttendanceStore + ?Sized,
{
    if store.find_event(event_id).await?.is_none() {
        return Err(CoreError::EventNotFound);
    }
    Ok(store.list_attendance(event_id).await?)
}
