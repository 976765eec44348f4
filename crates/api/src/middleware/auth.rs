//! Bearer token resolution.
//!
//! `resolve_principal` runs on every API route. It never rejects: a valid
//! token puts a [`Principal`] in the request extensions, an invalid one
//! leaves an [`AuthRejection`] so guarded handlers can say why.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use domain::models::Principal;
use shared::jwt::{JwtConfig, JwtError};

use crate::app::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a supplied bearer token was not accepted.
#[derive(Debug, Clone)]
pub struct AuthRejection(pub String);

/// The bearer token from `Authorization`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies a token and turns its claims into a principal.
pub fn authenticate(jwt: &JwtConfig, token: &str) -> Result<Principal, JwtError> {
    let claims = jwt.validate_token(token)?;
    Ok(Principal::new(claims.sub, claims.role))
}

pub async fn resolve_principal(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let outcome = bearer_token(req.headers()).map(|token| authenticate(&state.jwt, token));

    match outcome {
        Some(Ok(principal)) => {
            tracing::debug!(subject = %principal.subject, role = %principal.role, "Principal resolved");
            req.extensions_mut().insert(principal);
        }
        Some(Err(err)) => {
            tracing::debug!(error = %err, "Bearer token rejected");
            let reason = match err {
                JwtError::TokenExpired => "Token has expired",
                _ => "Invalid token",
            };
            req.extensions_mut().insert(AuthRejection(reason.to_string()));
        }
        None => {}
    }

    next.run(req).await
}
