//! Custom Axum extractors.

pub mod json_body;
pub mod principal;

pub use json_body::JsonBody;
pub use principal::{AdminPrincipal, CurrentPrincipal, OptionalPrincipal};
