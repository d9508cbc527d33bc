//! Waymark Database — SurrealDB connection management, schema
//! migrations, and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - SurrealDB implementations of the `waymark-core` repository traits
//! - Error types ([`DbError`])
//!
//! The store is used strictly per-key: every statement issued here
//! touches a single record, and nothing relies on cross-key
//! transactions. Cross-record consistency is the redemption engine's
//! job (per-key locking).

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
