//! Error taxonomy shared by the core services.

use shared::IdentifierError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// Request body failed its field rules.
    #[error("{}", validation_summary(.0))]
    InvalidRequest(#[from] ValidationErrors),

    #[error("{0}")]
    Validation(String),

    #[error("event not found")]
    EventNotFound,

    #[error("event cancelled")]
    EventCancelled,

    #[error("event full")]
    CapacityFull,

    #[error("registration not found")]
    RegistrationNotFound,

    #[error("invalid token")]
    InvalidToken,

    #[error("event already exists: {0}")]
    EventExists(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EventNotFound(_) => CoreError::EventNotFound,
            StoreError::DuplicateEvent(id) => CoreError::EventExists(id),
            other => CoreError::Store(other),
        }
    }
}

/// Field messages of a failed validation, sorted and joined with `; `.
pub fn validation_summary(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
