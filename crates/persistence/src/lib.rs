//! Persistence layer for the campus events backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - [`PgStore`], the Postgres implementation of the domain store traits

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod store;
pub mod upsert;

pub use store::PgStore;
pub use upsert::UpsertStrategy;
