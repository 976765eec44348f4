use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::{AlreadyRegisteredResponse, RegistrationStatus};
use domain::services::{error::validation_summary, CoreError};
use domain::store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The pair is already registered; the body hands back the stored token.
    #[error("Already registered ({status})")]
    RegistrationConflict {
        token: String,
        status: RegistrationStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level failures; the body lists each field.
    #[error("Validation error: {message}")]
    InvalidFields {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::RegistrationConflict { token, status } => {
                let body = AlreadyRegisteredResponse {
                    error: "already_registered".into(),
                    message: "already registered".into(),
                    token,
                    status,
                };
                return (StatusCode::CONFLICT, Json(body)).into_response();
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::InvalidFields {
                message,
                details: fields,
            } => {
                details = Some(fields);
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidIdentifier(e) => ApiError::Validation(e.to_string()),
            CoreError::InvalidRequest(errors) => ApiError::from(errors),
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::EventNotFound => ApiError::NotFound("event not found".into()),
            CoreError::EventCancelled => ApiError::Validation("event cancelled".into()),
            CoreError::CapacityFull => ApiError::Validation("event full".into()),
            CoreError::RegistrationNotFound => {
                ApiError::NotFound("registration not found".into())
            }
            CoreError::InvalidToken => ApiError::NotFound("invalid token".into()),
            CoreError::EventExists(id) => {
                ApiError::Conflict(format!("event {} already exists", id))
            }
            CoreError::Store(e) => ApiError::from(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EventNotFound(_) => ApiError::NotFound("event not found".into()),
            StoreError::DuplicateEvent(id) => {
                ApiError::Conflict(format!("event {} already exists", id))
            }
            other => ApiError::Internal(format!("Storage error: {}", other)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));

        ApiError::InvalidFields {
            message: validation_summary(&errors),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use shared::IdentifierError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_statuses() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_internal_error_message_masked() {
        let response = ApiError::Internal("connection refused".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_registration_conflict_body() {
        let response = ApiError::RegistrationConflict {
            token: "tok123".into(),
            status: RegistrationStatus::Registered,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "already_registered");
        assert_eq!(body["token"], "tok123");
        assert_eq!(body["status"], "registered");
    }

    #[test]
    fn test_core_error_mapping() {
        assert!(matches!(
            ApiError::from(CoreError::InvalidIdentifier(IdentifierError::Empty("student_id"))),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::CapacityFull),
            ApiError::Validation(ref m) if m == "event full"
        ));
        assert!(matches!(
            ApiError::from(CoreError::EventCancelled),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::EventNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::InvalidToken),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::EventExists("ev1".into())),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::Store(StoreError::Transient("timeout".into()))),
            ApiError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_field_errors_listed_in_body() {
        let mut errors = validator::ValidationErrors::new();
        let mut rating = validator::ValidationError::new("range");
        rating.message = Some("rating must be between 1 and 5".into());
        errors.add("rating", rating);

        let err = ApiError::from(CoreError::InvalidRequest(errors));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "rating must be between 1 and 5");
        assert_eq!(body["details"][0]["field"], "rating");
        assert_eq!(body["details"][0]["message"], "rating must be between 1 and 5");
    }

    #[tokio::test]
    async fn test_plain_validation_has_no_details() {
        let body = body_json(ApiError::Validation("event full".into()).into_response()).await;
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::NotFound("event not found".into()).to_string(),
            "Not found: event not found"
        );
    }
}
