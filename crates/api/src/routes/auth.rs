//! Identity introspection.

use axum::Json;
use serde::Serialize;
use shared::Role;

use crate::extractors::OptionalPrincipal;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// GET /auth/whoami
pub async fn whoami(OptionalPrincipal(principal): OptionalPrincipal) -> Json<WhoAmIResponse> {
    Json(match principal {
        Some(p) => WhoAmIResponse {
            authenticated: true,
            subject: Some(p.subject),
            role: Some(p.role),
        },
        None => WhoAmIResponse {
            authenticated: false,
            subject: None,
            role: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Principal;

    #[tokio::test]
    async fn test_whoami_anonymous() {
        let Json(response) = whoami(OptionalPrincipal(None)).await;
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json, serde_json::json!({"authenticated": false}));
    }

    #[tokio::test]
    async fn test_whoami_authenticated() {
        let principal = Principal::new("ops@campus.test", Role::Admin);
        let Json(response) = whoami(OptionalPrincipal(Some(principal))).await;
        assert!(response.authenticated);
        assert_eq!(response.role, Some(Role::Admin));
    }
}
