//! Entity facades and feature use-case services.
//!
//! # Responsibility
//! - Expose typed CRUD per entity over the document store.
//! - Orchestrate multi-record feature flows (habit completion and reset,
//!   todo board, journal moods, school planner) on top of the facades.
//! - Validate caller input before any store call.
//!
//! # Invariants
//! - Services never bypass facades to write documents.
//! - Multi-document flows are plain sequences; there is no rollback.

use crate::store::error::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod facade;
pub mod habit_service;
pub mod journal_service;
pub mod planner_service;
pub mod profile_service;
pub mod todo_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by feature services.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller input failed validation; nothing was written.
    InvalidInput(String),
    /// Referenced record does not exist.
    NotFound { target: String, id: String },
    /// A write succeeded but its read-back did not.
    InconsistentState(&'static str),
    Store(StoreError),
}

impl ServiceError {
    pub(crate) fn not_found(target: &str, id: &str) -> Self {
        Self::NotFound {
            target: target.to_string(),
            id: id.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound { target, id } => write!(f, "{target} not found: {id}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { path, id } => Self::NotFound { target: path, id },
            other => Self::Store(other),
        }
    }
}

/// Rejects blank text fields.
pub(crate) fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must not be blank"
        )));
    }
    Ok(())
}
