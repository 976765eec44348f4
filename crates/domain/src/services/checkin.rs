//! Check-in by registration token.

use chrono::{DateTime, Utc};
use shared::{normalize_student_id, StudentId};
use tracing::debug;

use super::attendance::{mark_normalized, MarkResult};
use super::CoreError;
use crate::store::{AttendanceStore, RegistrationStore};

/// Maps a token to its (event, student) pair.
///
/// Only tokens of active registrations resolve; withdrawn or unknown tokens
/// are reported as [`CoreError::InvalidToken`].
pub async fn resolve_token<S>(store: &S, token: &str) -> Result<(String, StudentId), CoreError>
where
    S: RegistrationStore + ?Sized,
{
    let token = token.trim();
    if token.is_empty() {
        return Err(CoreError::Validation("token required".to_string()));
    }

    let registration = store
        .find_active_by_token(token)
        .await?
        .ok_or(CoreError::InvalidToken)?;

    // Rows written before normalization existed may carry mixed case.
    let student_id = normalize_student_id(registration.student_id.as_str())?;
    Ok((registration.event_id, student_id))
}

/// Resolves a token and marks its student present.
pub async fn check_in_by_token<S>(
    store: &S,
    token: &str,
    now: DateTime<Utc>,
) -> Result<MarkResult, CoreError>
where
    S: RegistrationStore + AttendanceStore + ?Sized,
{
    let (event_id, student_id) = resolve_token(store, token).await?;
    debug!(event_id = %event_id, student_id = %student_id, "Token resolved");
    mark_normalized(store, &event_id, &student_id, now).await
}
