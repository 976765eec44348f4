//! Principal extractors.
//!
//! All three read what `resolve_principal` left in the request extensions.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::Principal;

use crate::error::ApiError;
use crate::middleware::auth::AuthRejection;

fn unauthenticated(parts: &Parts) -> ApiError {
    match parts.extensions.get::<AuthRejection>() {
        Some(rejection) => ApiError::Unauthorized(rejection.0.clone()),
        None => ApiError::Unauthorized("Missing Authorization header".to_string()),
    }
}

/// Any authenticated caller; 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| unauthenticated(parts))
    }
}

/// The caller if authenticated; never rejects.
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}

/// An administrator; 401 without credentials, 403 for other roles.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            tracing::debug!(subject = %principal.subject, "Admin route refused");
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use shared::Role;

    fn parts_with(principal: Option<Principal>, rejection: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        if let Some(p) = principal {
            req.extensions_mut().insert(p);
        }
        if let Some(r) = rejection {
            req.extensions_mut().insert(AuthRejection(r.to_string()));
        }
        req.into_parts().0
    }

    #[tokio::test]
    async fn test_current_principal_missing() {
        let mut parts = parts_with(None, None);
        let err = CurrentPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m.contains("Missing")));
    }

    #[tokio::test]
    async fn test_current_principal_reports_rejection() {
        let mut parts = parts_with(None, Some("Token has expired"));
        let err = CurrentPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Token has expired"));
    }

    #[tokio::test]
    async fn test_admin_principal_forbidden_for_student() {
        let mut parts = parts_with(Some(Principal::new("s1", Role::Student)), None);
        let err = AdminPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_principal_accepts_admin() {
        let mut parts = parts_with(Some(Principal::new("a1", Role::Admin)), None);
        let AdminPrincipal(principal) = AdminPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(principal.subject, "a1");
    }

    #[tokio::test]
    async fn test_optional_principal() {
        let mut parts = parts_with(None, Some("Invalid token"));
        let OptionalPrincipal(principal) = OptionalPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(principal.is_none());
    }
}
