//! HTTP route handlers.

pub mod attendance;
pub mod auth;
pub mod events;
pub mod feedback;
pub mod health;
pub mod registrations;
