//! Process-local document backend.
//!
//! Documents live in per-path vectors in insertion order and are evaluated
//! with the shared `store::query` evaluator, so results match the SQLite
//! backend for the same data. `set_offline(true)` makes every operation
//! fail with `StoreError::Unavailable`.

use crate::model::document::{CollectionPath, Document, Fields};
use crate::store::backend::{merge_fields, new_document_id, DocumentBackend};
use crate::store::error::{StoreError, StoreResult};
use crate::store::query::DocumentQuery;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryDocumentBackend {
    collections: RefCell<HashMap<CollectionPath, Vec<Document>>>,
    offline: Cell<bool>,
}

impl MemoryDocumentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates connectivity loss for every subsequent operation.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.get()
    }

    /// Number of stored documents across all paths.
    pub fn len(&self) -> usize {
        self.collections.borrow().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.get() {
            return Err(StoreError::Unavailable(
                "memory backend is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl DocumentBackend for MemoryDocumentBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn insert(&self, path: &CollectionPath, fields: &Fields) -> StoreResult<Document> {
        self.ensure_online()?;
        let document = Document::new(new_document_id(), fields.clone());
        self.collections
            .borrow_mut()
            .entry(path.clone())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    fn query(&self, path: &CollectionPath, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        self.ensure_online()?;
        query.validate()?;
        let documents = self
            .collections
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_default();
        Ok(query.apply(documents))
    }

    fn fetch(&self, path: &CollectionPath, id: &str) -> StoreResult<Option<Document>> {
        self.ensure_online()?;
        Ok(self
            .collections
            .borrow()
            .get(path)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id).cloned()))
    }

    fn merge(&self, path: &CollectionPath, id: &str, partial: &Fields) -> StoreResult<()> {
        self.ensure_online()?;
        let mut collections = self.collections.borrow_mut();
        let document = collections
            .get_mut(path)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
                id: id.to_string(),
            })?;
        merge_fields(&mut document.fields, partial);
        Ok(())
    }

    fn remove(&self, path: &CollectionPath, id: &str) -> StoreResult<()> {
        self.ensure_online()?;
        let mut collections = self.collections.borrow_mut();
        let documents = collections.get_mut(path);
        let position = documents
            .as_ref()
            .and_then(|documents| documents.iter().position(|doc| doc.id == id));
        match (documents, position) {
            (Some(documents), Some(index)) => {
                documents.remove(index);
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                path: path.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDocumentBackend;
    use crate::model::document::{CollectionPath, Fields};
    use crate::store::backend::DocumentBackend;
    use crate::store::query::DocumentQuery;

    #[test]
    fn offline_backend_rejects_reads_and_writes() {
        let backend = MemoryDocumentBackend::new();
        let path = CollectionPath::new("alice", "todos").unwrap();
        backend.set_offline(true);

        assert!(backend.insert(&path, &Fields::new()).unwrap_err().is_unavailable());
        assert!(backend
            .query(&path, &DocumentQuery::default())
            .unwrap_err()
            .is_unavailable());
    }

    #[test]
    fn remove_drops_only_the_target_document() {
        let backend = MemoryDocumentBackend::new();
        let path = CollectionPath::new("alice", "todos").unwrap();
        let first = backend.insert(&path, &Fields::new()).unwrap();
        let second = backend.insert(&path, &Fields::new()).unwrap();

        backend.remove(&path, &first.id).unwrap();

        assert_eq!(backend.len(), 1);
        assert!(backend.fetch(&path, &second.id).unwrap().is_some());
        assert!(backend.remove(&path, &first.id).unwrap_err().is_not_found());
    }
}
