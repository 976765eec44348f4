//! Attendance domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::StudentId;

/// The single attendance row kept per (event, student) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Attendance {
    pub att_id: i64,
    pub event_id: String,
    pub student_id: StudentId,
    pub present: bool,
    pub attended_at: DateTime<Utc>,
}

/// Whether a check-in created the pair's row or re-marked an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Created,
    Updated,
}

impl MarkOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkOutcome::Created => "created",
            MarkOutcome::Updated => "updated",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MarkOutcome::Created => "attendance marked",
            MarkOutcome::Updated => "attendance updated",
        }
    }
}

/// Request payload for direct check-in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MarkAttendanceRequest {
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Request payload for check-in by registration token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TokenCheckInRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Response payload for both check-in paths.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceResponse {
    pub message: String,
    pub event_id: String,
    pub student_id: StudentId,
    pub attended_at: DateTime<Utc>,
}

impl AttendanceResponse {
    pub fn new(outcome: MarkOutcome, attendance: &Attendance) -> Self {
        Self {
            message: outcome.message().to_string(),
            event_id: attendance.event_id.clone(),
            student_id: attendance.student_id.clone(),
            attended_at: attendance.attended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::normalize_student_id;

    #[test]
    fn test_outcome_messages() {
        assert_eq!(MarkOutcome::Created.message(), "attendance marked");
        assert_eq!(MarkOutcome::Updated.message(), "attendance updated");
        assert_eq!(MarkOutcome::Created.as_str(), "created");
    }

    #[test]
    fn test_response_from_row() {
        let row = Attendance {
            att_id: 7,
            event_id: "ev1".to_string(),
            student_id: normalize_student_id("R001").unwrap(),
            present: true,
            attended_at: Utc::now(),
        };
        let response = AttendanceResponse::new(MarkOutcome::Updated, &row);
        assert_eq!(response.message, "attendance updated");
        assert_eq!(response.student_id.as_str(), "r001");
        assert_eq!(response.attended_at, row.attended_at);
    }

    #[test]
    fn test_token_request_missing() {
        let request: TokenCheckInRequest = serde_json::from_str("{}").unwrap();
        assert!(request.token.is_none());
    }
}
