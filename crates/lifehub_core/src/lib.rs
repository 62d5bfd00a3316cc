//! Core domain logic for LifeHub.
//! Owner-scoped document storage, typed entity facades, derived state and
//! feature services for habits, todos, journal and school planning.

pub mod config;
pub mod db;
pub mod derive;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{CollectionPath, Document, DocumentId, Fields};
pub use model::entity::{Entity, OwnerField};
pub use service::facade::{EntityFacade, FilterCriteria, OwnerScope};
pub use service::habit_service::{HabitService, ResetError, ResetReport};
pub use service::{ServiceError, ServiceResult};
pub use store::backend::DocumentBackend;
pub use store::client::{DocumentStore, Subscription};
pub use store::error::{StoreError, StoreResult};
pub use store::memory::MemoryDocumentBackend;
pub use store::query::{Comparison, Direction, OrderBy, Predicate};
pub use store::sqlite::SqliteDocumentBackend;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
