//! Admission decisions for new registrations.

use thiserror::Error;

use super::CoreError;
use crate::models::Event;

/// Why a registration cannot be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("event cancelled")]
    EventCancelled,

    #[error("event full (capacity {capacity})")]
    CapacityFull { capacity: i32 },
}

impl From<AdmissionError> for CoreError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::EventCancelled => CoreError::EventCancelled,
            AdmissionError::CapacityFull { .. } => CoreError::CapacityFull,
        }
    }
}

/// Decides whether one more active registration fits.
///
/// Cancellation wins over any remaining capacity. `active_count` must be
/// read from the store for this decision, never cached.
pub fn can_admit(event: &Event, active_count: i64) -> Result<(), AdmissionError> {
    if event.cancelled {
        return Err(AdmissionError::EventCancelled);
    }

    match event.capacity {
        None => Ok(()),
        Some(capacity) if active_count < i64::from(capacity) => Ok(()),
        Some(capacity) => Err(AdmissionError::CapacityFull { capacity }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(capacity: Option<i32>, cancelled: bool) -> Event {
        Event {
            event_id: "ev1".to_string(),
            title: "Orientation".to_string(),
            event_type: "talk".to_string(),
            description: String::new(),
            starts_at: Utc::now(),
            capacity,
            college_id: "c1".to_string(),
            cancelled,
            features: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unlimited_capacity_admits() {
        assert!(can_admit(&event(None, false), 10_000).is_ok());
    }

    #[test]
    fn test_capacity_boundary() {
        let e = event(Some(2), false);
        assert!(can_admit(&e, 0).is_ok());
        assert!(can_admit(&e, 1).is_ok());
        assert_eq!(
            can_admit(&e, 2),
            Err(AdmissionError::CapacityFull { capacity: 2 })
        );
    }

    #[test]
    fn test_zero_capacity_rejects_everyone() {
        assert!(can_admit(&event(Some(0), false), 0).is_err());
    }

    #[test]
    fn test_cancelled_takes_precedence() {
        assert_eq!(
            can_admit(&event(Some(100), true), 0),
            Err(AdmissionError::EventCancelled)
        );
        assert_eq!(
            can_admit(&event(None, true), 0),
            Err(AdmissionError::EventCancelled)
        );
    }
}
