//! Storage strategy contract behind `DocumentStore`.
//!
//! # Responsibility
//! - Define the primitive operations every persistence backend provides.
//!
//! # Invariants
//! - `insert` assigns a fresh, non-empty id unique within the path.
//! - `merge` and `remove` return `StoreError::NotFound` for unknown ids.
//! - `query` honors `DocumentQuery` semantics exactly as the in-process
//!   evaluator in `store::query` does.

use crate::model::document::{CollectionPath, Document, DocumentId, Fields};
use crate::store::error::StoreResult;
use crate::store::query::DocumentQuery;

/// Persistence backend for owner-scoped documents.
pub trait DocumentBackend {
    /// Short backend name for diagnostics (`sqlite`, `memory`).
    fn kind(&self) -> &'static str;
    /// Writes a new document and returns it with its assigned id.
    fn insert(&self, path: &CollectionPath, fields: &Fields) -> StoreResult<Document>;
    /// Reads documents matching `query` under `path`.
    fn query(&self, path: &CollectionPath, query: &DocumentQuery) -> StoreResult<Vec<Document>>;
    /// Reads one document by id.
    fn fetch(&self, path: &CollectionPath, id: &str) -> StoreResult<Option<Document>>;
    /// Overwrites the top-level keys present in `partial`.
    fn merge(&self, path: &CollectionPath, id: &str, partial: &Fields) -> StoreResult<()>;
    /// Hard-deletes one document.
    fn remove(&self, path: &CollectionPath, id: &str) -> StoreResult<()>;
}

impl<T: DocumentBackend + ?Sized> DocumentBackend for Box<T> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn insert(&self, path: &CollectionPath, fields: &Fields) -> StoreResult<Document> {
        (**self).insert(path, fields)
    }

    fn query(&self, path: &CollectionPath, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        (**self).query(path, query)
    }

    fn fetch(&self, path: &CollectionPath, id: &str) -> StoreResult<Option<Document>> {
        (**self).fetch(path, id)
    }

    fn merge(&self, path: &CollectionPath, id: &str, partial: &Fields) -> StoreResult<()> {
        (**self).merge(path, id, partial)
    }

    fn remove(&self, path: &CollectionPath, id: &str) -> StoreResult<()> {
        (**self).remove(path, id)
    }
}

/// Generates a new backend document id.
pub fn new_document_id() -> DocumentId {
    uuid::Uuid::new_v4().to_string()
}

/// Overwrites `target` keys with every key of `partial`.
pub fn merge_fields(target: &mut Fields, partial: &Fields) {
    for (key, value) in partial {
        target.insert(key.clone(), value.clone());
    }
}
