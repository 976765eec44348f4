//! Registration domain model.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shared::StudentId;
use std::fmt;
use std::str::FromStr;

/// Number of random bytes behind a recovery token (22 URL-safe characters).
pub const TOKEN_RANDOM_BYTES: usize = 16;

/// Lifecycle state of a registration row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Withdrawn,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Active registrations count against capacity and honor their token.
    pub fn is_active(self) -> bool {
        matches!(self, RegistrationStatus::Registered)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(RegistrationStatus::Registered),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "withdrawn" => Ok(RegistrationStatus::Withdrawn),
            other => Err(format!("Unknown registration status: {}", other)),
        }
    }
}

/// One student's registration for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub reg_id: i64,
    pub event_id: String,
    pub student_id: StudentId,
    pub token: String,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Registration row to be inserted.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: String,
    pub student_id: StudentId,
    pub token: String,
    pub registered_at: DateTime<Utc>,
}

/// A student's registration joined with event metadata.
///
/// Event fields are optional because the join is a left join.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationWithEvent {
    pub reg_id: i64,
    pub event_id: String,
    pub token: String,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub event_title: Option<String>,
    pub event_starts_at: Option<DateTime<Utc>>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub event_capacity: Option<i32>,
}

/// Request payload for registering a student.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterRequest {
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Response payload for a newly created registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

/// Response payload when the pair is already registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AlreadyRegisteredResponse {
    pub error: String,
    pub message: String,
    pub token: String,
    pub status: RegistrationStatus,
}

/// Query parameters for looking up a student's registrations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StudentRegistrationsQuery {
    pub student_id: Option<String>,
}

/// Generates an unguessable, URL-safe recovery token.
pub fn generate_registration_token() -> String {
    let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_length_and_alphabet() {
        let token = generate_registration_token();
        assert_eq!(token.len(), 22);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generate_token_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_registration_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            RegistrationStatus::Registered,
            RegistrationStatus::Cancelled,
            RegistrationStatus::Withdrawn,
        ] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
        assert!("pending".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn test_only_registered_is_active() {
        assert!(RegistrationStatus::Registered.is_active());
        assert!(!RegistrationStatus::Cancelled.is_active());
        assert!(!RegistrationStatus::Withdrawn.is_active());
    }

    #[test]
    fn test_register_request_missing_student_id() {
        let request: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(request.student_id.is_none());
    }
}
