//! Translation of Postgres failures into store errors.

use domain::store::StoreError;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const SERIALIZATION_FAILURE: &str = "40001";
pub const DEADLOCK_DETECTED: &str = "40P01";

pub const REGISTRATION_TOKEN_CONSTRAINT: &str = "registrations_token_key";
pub const ATTENDANCE_PAIR_CONSTRAINT: &str = "attendance_event_student_key";
pub const EVENTS_PKEY_CONSTRAINT: &str = "events_pkey";

/// SQLSTATE code of a database error, if any.
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Name of the violated constraint, if reported.
pub fn constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// Failures that may succeed on a second attempt.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(_) => matches!(
            sqlstate(err).as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

/// Maps a driver error for a write that references `event_id`.
pub fn map_write_error(err: sqlx::Error, event_id: &str) -> StoreError {
    if is_foreign_key_violation(&err) {
        return StoreError::EventNotFound(event_id.to_string());
    }
    map_error(err)
}

pub fn map_error(err: sqlx::Error) -> StoreError {
    if is_transient(&err) {
        StoreError::Transient(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert_eq!(sqlstate(&sqlx::Error::PoolTimedOut), None);
        assert_eq!(constraint(&sqlx::Error::PoolTimedOut), None);
    }

    #[test]
    fn test_map_error() {
        assert!(map_error(sqlx::Error::PoolTimedOut).is_transient());
        assert!(matches!(
            map_write_error(sqlx::Error::RowNotFound, "ev1"),
            StoreError::Backend(_)
        ));
    }
}
