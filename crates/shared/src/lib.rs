//! Shared utilities and common types for the campus events backend.
//!
//! This crate provides functionality used across all other crates:
//! - Identifier normalization for students and events
//! - Principal roles
//! - JWT bearer token signing and verification

pub mod identifier;
pub mod jwt;
pub mod role;

pub use identifier::{normalize_event_id, normalize_student_id, IdentifierError, StudentId};
pub use role::Role;
