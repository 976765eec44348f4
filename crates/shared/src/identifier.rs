//! Identifier normalization for students and events.
//!
//! Student identifiers are compared case-insensitively everywhere, so every
//! read and write site goes through [`normalize_student_id`] and works with the
//! canonical lower-case form. Event identifiers are stored exactly as given but
//! must match a restricted character set.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationError;

/// Maximum accepted length for a student identifier after trimming.
pub const MAX_STUDENT_ID_LENGTH: usize = 64;

/// Maximum accepted length for an event identifier.
pub const MAX_EVENT_ID_LENGTH: usize = 64;

lazy_static::lazy_static! {
    static ref EVENT_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

/// Error type for identifier normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("{0} is required")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("event_id may only contain letters, digits, '-' and '_'")]
    InvalidEventId,
}

/// Canonical student identifier (trimmed, lower-case, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Returns the canonical form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns the canonical string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalizes a raw student identifier.
///
/// Trims surrounding whitespace and lower-cases the result so that `R001`,
/// ` r001 ` and `r001` all denote the same student.
pub fn normalize_student_id(raw: &str) -> Result<StudentId, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty("student_id"));
    }
    if trimmed.chars().count() > MAX_STUDENT_ID_LENGTH {
        return Err(IdentifierError::TooLong {
            field: "student_id",
            max: MAX_STUDENT_ID_LENGTH,
        });
    }
    Ok(StudentId(trimmed.to_lowercase()))
}

/// Validates and trims an event identifier. Event ids are case-sensitive.
pub fn normalize_event_id(raw: &str) -> Result<String, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty("event_id"));
    }
    if trimmed.len() > MAX_EVENT_ID_LENGTH {
        return Err(IdentifierError::TooLong {
            field: "event_id",
            max: MAX_EVENT_ID_LENGTH,
        });
    }
    if !EVENT_ID_REGEX.is_match(trimmed) {
        return Err(IdentifierError::InvalidEventId);
    }
    Ok(trimmed.to_string())
}

/// `validator` hook for request bodies carrying an event id.
pub fn validate_event_id(raw: &str) -> Result<(), ValidationError> {
    normalize_event_id(raw).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("event_id_format");
        err.message = Some(e.to_string().into());
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::{faker::lorem::en::Word, Fake};

    #[test]
    fn test_normalize_student_id_case_insensitive() {
        let upper = normalize_student_id("R001").unwrap();
        let lower = normalize_student_id("r001").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "r001");
    }

    #[test]
    fn test_normalize_student_id_trims() {
        let id = normalize_student_id("  S-42\t").unwrap();
        assert_eq!(id.as_str(), "s-42");
    }

    #[test]
    fn test_normalize_student_id_empty() {
        assert_eq!(
            normalize_student_id("   "),
            Err(IdentifierError::Empty("student_id"))
        );
        assert_eq!(
            normalize_student_id(""),
            Err(IdentifierError::Empty("student_id"))
        );
    }

    #[test]
    fn test_normalize_student_id_too_long() {
        let raw = "x".repeat(MAX_STUDENT_ID_LENGTH + 1);
        assert!(matches!(
            normalize_student_id(&raw),
            Err(IdentifierError::TooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_student_id_idempotent() {
        let word: String = Word().fake();
        let once = normalize_student_id(&word.to_uppercase()).unwrap();
        let twice = normalize_student_id(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_student_id_serializes_transparently() {
        let id = normalize_student_id("AB12").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ab12\"");
    }

    #[test]
    fn test_normalize_event_id() {
        assert_eq!(normalize_event_id(" ev1 ").unwrap(), "ev1");
        assert_eq!(normalize_event_id("Ev_2-b").unwrap(), "Ev_2-b");
        assert_eq!(
            normalize_event_id(""),
            Err(IdentifierError::Empty("event_id"))
        );
        assert_eq!(
            normalize_event_id("ev 1"),
            Err(IdentifierError::InvalidEventId)
        );
        assert_eq!(
            normalize_event_id("ev/1"),
            Err(IdentifierError::InvalidEventId)
        );
    }

    #[test]
    fn test_validate_event_id_message() {
        let err = validate_event_id("bad id").unwrap_err();
        assert_eq!(err.code, "event_id_format");
        assert!(err.message.is_some());
    }
}
