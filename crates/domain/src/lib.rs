//! Domain layer for the campus events backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, Attendance, Feedback)
//! - Storage traits the core depends on, plus an in-memory implementation
//! - The registration/attendance consistency services

pub mod models;
pub mod services;
pub mod store;
