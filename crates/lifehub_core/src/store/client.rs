//! Owner-scoped document store client.
//!
//! # Responsibility
//! - Stamp `createdAt`/`updatedAt` on writes and delegate to a backend.
//! - Apply the offline fail-soft policy to reads.
//! - Push result sets to registered listeners after local writes.
//!
//! # Invariants
//! - Reads never raise `StoreError::Unavailable`; they return empty/absent.
//! - Writes propagate every error, including `Unavailable`.
//! - Listeners stay registered until `release` is called.

use crate::model::document::{
    CollectionPath, Document, Fields, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::store::backend::DocumentBackend;
use crate::store::error::{StoreError, StoreResult};
use crate::store::query::{DocumentQuery, OrderBy, Predicate};
use log::{debug, info, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide, so a handle never matches a listener of another store.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

type ListenerCallback = Rc<RefCell<dyn FnMut(&[Document])>>;

struct Listener {
    id: u64,
    path: CollectionPath,
    query: DocumentQuery,
    callback: ListenerCallback,
}

/// Handle for one `listen` registration.
///
/// Dropping the handle does not stop updates; pass it to
/// [`DocumentStore::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Document store client over an injected backend.
pub struct DocumentStore<B: DocumentBackend> {
    backend: B,
    listeners: RefCell<Vec<Listener>>,
}

impl<B: DocumentBackend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Writes a new document stamped with creation and update timestamps.
    pub fn create(&self, owner: &str, collection: &str, data: Fields) -> StoreResult<Document> {
        let path = collection_path(owner, collection)?;
        let now = now_millis();
        let mut fields = data;
        fields.remove(ID_FIELD);
        fields.insert(CREATED_AT_FIELD.to_string(), Value::from(now));
        fields.insert(UPDATED_AT_FIELD.to_string(), Value::from(now));

        let document = self.backend.insert(&path, &fields).map_err(|err| {
            warn!(
                "event=doc_create module=store status=error backend={} path={} error={}",
                self.backend.kind(),
                path,
                err
            );
            err
        })?;
        info!(
            "event=doc_create module=store status=ok backend={} path={}",
            self.backend.kind(),
            path
        );

        self.notify(&path);
        Ok(document)
    }

    /// Reads every document under the path.
    pub fn get_all(
        &self,
        owner: &str,
        collection: &str,
        order_by: Option<OrderBy>,
    ) -> StoreResult<Vec<Document>> {
        self.get_filtered(owner, collection, Vec::new(), order_by)
    }

    /// Reads documents matching every predicate, in order.
    pub fn get_filtered(
        &self,
        owner: &str,
        collection: &str,
        predicates: Vec<Predicate>,
        order_by: Option<OrderBy>,
    ) -> StoreResult<Vec<Document>> {
        let path = collection_path(owner, collection)?;
        let query = DocumentQuery::new(predicates, order_by);
        match self.backend.query(&path, &query) {
            Ok(documents) => {
                debug!(
                    "event=doc_query module=store status=ok path={} count={}",
                    path,
                    documents.len()
                );
                Ok(documents)
            }
            Err(err) if err.is_unavailable() => {
                warn!(
                    "event=doc_query module=store status=fallback path={} error={}",
                    path, err
                );
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Reads one document; `None` when missing or when the backend is offline.
    pub fn get_by_id(
        &self,
        owner: &str,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let path = collection_path(owner, collection)?;
        match self.backend.fetch(&path, id) {
            Ok(document) => Ok(document),
            Err(err) if err.is_unavailable() => {
                warn!(
                    "event=doc_get module=store status=fallback path={} id={} error={}",
                    path, id, err
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Merges `partial` into an existing document and refreshes `updatedAt`.
    pub fn update(
        &self,
        owner: &str,
        collection: &str,
        id: &str,
        partial: Fields,
    ) -> StoreResult<()> {
        let path = collection_path(owner, collection)?;
        let mut fields = partial;
        fields.remove(ID_FIELD);
        fields.remove(CREATED_AT_FIELD);
        fields.insert(UPDATED_AT_FIELD.to_string(), Value::from(now_millis()));

        self.backend.merge(&path, id, &fields).map_err(|err| {
            warn!(
                "event=doc_update module=store status=error path={} id={} error={}",
                path, id, err
            );
            err
        })?;
        debug!(
            "event=doc_update module=store status=ok path={} id={} keys={}",
            path,
            id,
            fields.len()
        );

        self.notify(&path);
        Ok(())
    }

    /// Hard-deletes one document.
    pub fn delete(&self, owner: &str, collection: &str, id: &str) -> StoreResult<()> {
        let path = collection_path(owner, collection)?;
        self.backend.remove(&path, id).map_err(|err| {
            warn!(
                "event=doc_delete module=store status=error path={} id={} error={}",
                path, id, err
            );
            err
        })?;
        info!(
            "event=doc_delete module=store status=ok path={} id={}",
            path, id
        );

        self.notify(&path);
        Ok(())
    }

    /// Registers `callback` for the query result set under the path.
    ///
    /// The current result set is pushed immediately, then again after every
    /// write made through this client to the same owner and collection.
    pub fn listen<F>(
        &self,
        owner: &str,
        collection: &str,
        predicates: Vec<Predicate>,
        order_by: Option<OrderBy>,
        callback: F,
    ) -> StoreResult<Subscription>
    where
        F: FnMut(&[Document]) + 'static,
    {
        let path = collection_path(owner, collection)?;
        let query = DocumentQuery::new(predicates, order_by);
        query.validate()?;

        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        let callback: ListenerCallback = Rc::new(RefCell::new(callback));

        self.listeners.borrow_mut().push(Listener {
            id,
            path: path.clone(),
            query: query.clone(),
            callback: Rc::clone(&callback),
        });
        info!(
            "event=doc_listen module=store status=ok path={} subscription={}",
            path, id
        );

        self.push_snapshot(id, &path, &query, &callback);
        Ok(Subscription { id })
    }

    /// Stops updates for a subscription. Returns `false` when the handle
    /// was issued by a different store.
    pub fn release(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != subscription.id);
        let removed = listeners.len() != before;
        debug!(
            "event=doc_release module=store status=ok subscription={} removed={}",
            subscription.id, removed
        );
        removed
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self, path: &CollectionPath) {
        let targets: Vec<(u64, DocumentQuery, ListenerCallback)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| &listener.path == path)
            .map(|listener| {
                (
                    listener.id,
                    listener.query.clone(),
                    Rc::clone(&listener.callback),
                )
            })
            .collect();

        for (id, query, callback) in targets {
            self.push_snapshot(id, path, &query, &callback);
        }
    }

    fn push_snapshot(
        &self,
        id: u64,
        path: &CollectionPath,
        query: &DocumentQuery,
        callback: &ListenerCallback,
    ) {
        let documents = match self.backend.query(path, query) {
            Ok(documents) => documents,
            Err(err) => {
                warn!(
                    "event=doc_listen module=store status=error path={} subscription={} error={}",
                    path, id, err
                );
                return;
            }
        };

        match callback.try_borrow_mut() {
            Ok(mut callback) => (&mut *callback)(&documents),
            Err(_) => warn!(
                "event=doc_listen module=store status=skipped path={} subscription={} reason=reentrant",
                path, id
            ),
        }
    }
}

fn collection_path(owner: &str, collection: &str) -> StoreResult<CollectionPath> {
    CollectionPath::new(owner, collection).map_err(StoreError::InvalidPath)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::DocumentStore;
    use crate::model::document::Fields;
    use crate::store::memory::MemoryDocumentBackend;
    use crate::store::error::StoreError;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_stamps_timestamps_and_drops_caller_id() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let doc = store
            .create("alice", "todos", fields(json!({"id": "forged", "title": "x"})))
            .unwrap();

        assert_ne!(doc.id, "forged");
        assert!(doc.get("id").is_none());
        assert!(doc.created_at().is_some());
        assert_eq!(doc.created_at(), doc.updated_at());
    }

    #[test]
    fn release_ignores_handles_from_another_store() {
        let mine = DocumentStore::new(MemoryDocumentBackend::new());
        let other = DocumentStore::new(MemoryDocumentBackend::new());
        let kept = mine.listen("u1", "todos", Vec::new(), None, |_| {}).unwrap();
        let foreign = other.listen("u1", "todos", Vec::new(), None, |_| {}).unwrap();

        assert!(!mine.release(foreign));
        assert_eq!(mine.listener_count(), 1);
        assert!(mine.release(kept));
        assert_eq!(mine.listener_count(), 0);
    }

    #[test]
    fn update_keeps_created_at() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let doc = store.create("alice", "todos", Fields::new()).unwrap();
        store
            .update("alice", "todos", &doc.id, fields(json!({"createdAt": 0})))
            .unwrap();

        let loaded = store.get_by_id("alice", "todos", &doc.id).unwrap().unwrap();
        assert_eq!(loaded.created_at(), doc.created_at());
    }

    #[test]
    fn blank_owner_is_rejected() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let err = store.get_all(" ", "todos", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }
}
