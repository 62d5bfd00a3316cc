//! Store-level error taxonomy.

use crate::db::DbError;
use crate::model::document::DocumentId;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by document backends and the store client.
#[derive(Debug)]
pub enum StoreError {
    /// Backend cannot be reached right now. Reads downgrade this to empty
    /// results; writes propagate it.
    Unavailable(String),
    /// Target document does not exist under the given path.
    NotFound { path: String, id: DocumentId },
    /// Owner or collection segment is malformed.
    InvalidPath(String),
    /// Predicate or ordering cannot be evaluated.
    InvalidQuery(String),
    /// Persisted or supplied data cannot be converted.
    InvalidData(String),
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl StoreError {
    /// Whether this error belongs to the offline fail-soft class.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::NotFound { path, id } => write!(f, "document not found: {path}/{id}"),
            Self::InvalidPath(message) => write!(f, "invalid document path: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid document query: {message}"),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "document store requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

/// Busy, locked, unopenable and I/O failures map to `Unavailable`.
impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        let unavailable = matches!(
            value.sqlite_error_code(),
            Some(
                ErrorCode::CannotOpen
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
            )
        );
        if unavailable {
            Self::Unavailable(value.to_string())
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_io_failures_are_unavailable() {
        assert!(StoreError::from(sqlite_failure(ffi::SQLITE_BUSY)).is_unavailable());
        assert!(StoreError::from(sqlite_failure(ffi::SQLITE_IOERR)).is_unavailable());
        assert!(StoreError::from(sqlite_failure(ffi::SQLITE_CANTOPEN)).is_unavailable());
    }

    #[test]
    fn constraint_failures_propagate_as_db_errors() {
        let err = StoreError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT));
        assert!(matches!(err, StoreError::Db(_)));
    }
}
