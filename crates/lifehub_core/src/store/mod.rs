//! Owner-scoped document persistence.
//!
//! # Responsibility
//! - Define the storage strategy contract (`DocumentBackend`).
//! - Provide SQLite and in-memory implementations with identical query
//!   semantics.
//! - Provide the `DocumentStore` client with fail-soft reads and listeners.
//!
//! # Invariants
//! - Documents are addressed as `users/{owner}/{collection}/{id}`.
//! - Not-found writes are semantic errors (`NotFound`), not silent no-ops.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod query;
pub mod sqlite;
