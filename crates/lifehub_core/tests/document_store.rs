use lifehub_core::db::{open_db, open_db_in_memory};
use lifehub_core::{
    DocumentBackend, DocumentStore, Fields, MemoryDocumentBackend, OrderBy, Predicate,
    SqliteDocumentBackend, StoreError,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

fn fields(value: Value) -> Fields {
    serde_json::from_value(value).unwrap()
}

fn on_sqlite(check: fn(&DocumentStore<SqliteDocumentBackend<'_>>)) {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::new(SqliteDocumentBackend::try_new(&conn).unwrap());
    check(&store);
}

fn on_memory(check: fn(&DocumentStore<MemoryDocumentBackend>)) {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    check(&store);
}

fn created_ids_are_unique<B: DocumentBackend>(store: &DocumentStore<B>) {
    let mut ids = HashSet::new();
    for n in 0..20 {
        let document = store
            .create("u1", "todos", fields(json!({ "title": format!("t{n}") })))
            .unwrap();
        assert!(!document.id.is_empty());
        assert!(ids.insert(document.id));
    }
    assert_eq!(store.get_all("u1", "todos", None).unwrap().len(), 20);
}

fn update_merges_and_keeps_other_keys<B: DocumentBackend>(store: &DocumentStore<B>) {
    let created = store
        .create(
            "u1",
            "todos",
            fields(json!({ "title": "Buy milk", "priority": "high", "completed": false })),
        )
        .unwrap();
    store
        .update("u1", "todos", &created.id, fields(json!({ "completed": true })))
        .unwrap();

    let read = store.get_by_id("u1", "todos", &created.id).unwrap().unwrap();
    assert_eq!(read.get("completed"), Some(&json!(true)));
    assert_eq!(read.get("title"), Some(&json!("Buy milk")));
    assert_eq!(read.get("priority"), Some(&json!("high")));
    assert_eq!(read.created_at(), created.created_at());
    assert!(read.updated_at() >= created.updated_at());
}

fn missing_document_writes_are_not_found<B: DocumentBackend>(store: &DocumentStore<B>) {
    let update = store.update("u1", "todos", "ghost", fields(json!({ "a": 1 })));
    assert!(matches!(update, Err(StoreError::NotFound { .. })));
    let delete = store.delete("u1", "todos", "ghost");
    assert!(matches!(delete, Err(StoreError::NotFound { .. })));
}

fn deleted_documents_disappear<B: DocumentBackend>(store: &DocumentStore<B>) {
    let keep = store
        .create("u1", "todos", fields(json!({ "title": "keep" })))
        .unwrap();
    let gone = store
        .create("u1", "todos", fields(json!({ "title": "gone" })))
        .unwrap();
    store.delete("u1", "todos", &gone.id).unwrap();

    assert!(store.get_by_id("u1", "todos", &gone.id).unwrap().is_none());
    let ids: Vec<String> = store
        .get_all("u1", "todos", None)
        .unwrap()
        .into_iter()
        .map(|document| document.id)
        .collect();
    assert_eq!(ids, vec![keep.id]);
    let filtered = store
        .get_filtered("u1", "todos", vec![Predicate::eq("title", "gone")], None)
        .unwrap();
    assert!(filtered.is_empty());
}

fn owners_and_collections_are_isolated<B: DocumentBackend>(store: &DocumentStore<B>) {
    store
        .create("alice", "todos", fields(json!({ "title": "a" })))
        .unwrap();
    store
        .create("bob", "todos", fields(json!({ "title": "b" })))
        .unwrap();
    store
        .create("alice", "goals", fields(json!({ "title": "g" })))
        .unwrap();

    assert_eq!(store.get_all("alice", "todos", None).unwrap().len(), 1);
    assert_eq!(store.get_all("bob", "todos", None).unwrap().len(), 1);
    assert_eq!(store.get_all("bob", "goals", None).unwrap().len(), 0);
}

fn filters_and_ordering_follow_json_values<B: DocumentBackend>(store: &DocumentStore<B>) {
    for (title, rank, done) in [("c", 3, false), ("a", 1, true), ("b", 2, false)] {
        store
            .create(
                "u1",
                "todos",
                fields(json!({ "title": title, "rank": rank, "completed": done })),
            )
            .unwrap();
    }
    store
        .create("u1", "todos", fields(json!({ "title": "unranked" })))
        .unwrap();

    let titles = |documents: Vec<lifehub_core::Document>| -> Vec<String> {
        documents
            .iter()
            .map(|document| document.get("title").unwrap().as_str().unwrap().to_string())
            .collect()
    };

    let asc = store
        .get_all("u1", "todos", Some(OrderBy::asc("rank")))
        .unwrap();
    assert_eq!(titles(asc), vec!["unranked", "a", "b", "c"]);

    let desc = store
        .get_all("u1", "todos", Some(OrderBy::desc("rank")))
        .unwrap();
    assert_eq!(titles(desc), vec!["c", "b", "a", "unranked"]);

    let open = store
        .get_filtered(
            "u1",
            "todos",
            vec![Predicate::eq("completed", false), Predicate::ge("rank", 2)],
            Some(OrderBy::asc("rank")),
        )
        .unwrap();
    assert_eq!(titles(open), vec!["b", "c"]);

    let missing = store
        .get_filtered("u1", "todos", vec![Predicate::eq("rank", Value::Null)], None)
        .unwrap();
    assert_eq!(titles(missing), vec!["unranked"]);
}

fn large_integers_match_exactly<B: DocumentBackend>(store: &DocumentStore<B>) {
    store
        .create("u1", "counters", fields(json!({ "v": 9_007_199_254_740_993_i64 })))
        .unwrap();

    let near = store
        .get_filtered(
            "u1",
            "counters",
            vec![Predicate::eq("v", 9_007_199_254_740_992_i64)],
            None,
        )
        .unwrap();
    assert!(near.is_empty());

    let exact = store
        .get_filtered(
            "u1",
            "counters",
            vec![Predicate::eq("v", 9_007_199_254_740_993_i64)],
            None,
        )
        .unwrap();
    assert_eq!(exact.len(), 1);
}

fn invalid_field_names_are_rejected<B: DocumentBackend>(store: &DocumentStore<B>) {
    let result = store.get_filtered(
        "u1",
        "todos",
        vec![Predicate::eq("title'); DROP TABLE documents; --", "x")],
        None,
    );
    assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
}

fn listeners_see_writes_until_released<B: DocumentBackend>(store: &DocumentStore<B>) {
    let snapshots: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&snapshots);
    let subscription = store
        .listen(
            "u1",
            "todos",
            vec![Predicate::eq("completed", false)],
            None,
            move |documents| sink.borrow_mut().push(documents.len()),
        )
        .unwrap();

    let first = store
        .create("u1", "todos", fields(json!({ "completed": false })))
        .unwrap();
    store
        .create("u2", "todos", fields(json!({ "completed": false })))
        .unwrap();
    store
        .update("u1", "todos", &first.id, fields(json!({ "completed": true })))
        .unwrap();

    assert!(store.release(subscription));
    store
        .create("u1", "todos", fields(json!({ "completed": false })))
        .unwrap();

    assert_eq!(*snapshots.borrow(), vec![0, 1, 0]);
    assert_eq!(store.listener_count(), 0);
}

macro_rules! on_both_backends {
    ($($name:ident),* $(,)?) => {
        mod sqlite_backend {
            $(
                #[test]
                fn $name() {
                    super::on_sqlite(|store| super::$name(store));
                }
            )*
        }
        mod memory_backend {
            $(
                #[test]
                fn $name() {
                    super::on_memory(|store| super::$name(store));
                }
            )*
        }
    };
}

on_both_backends!(
    created_ids_are_unique,
    update_merges_and_keeps_other_keys,
    missing_document_writes_are_not_found,
    deleted_documents_disappear,
    owners_and_collections_are_isolated,
    filters_and_ordering_follow_json_values,
    large_integers_match_exactly,
    invalid_field_names_are_rejected,
    listeners_see_writes_until_released,
);

#[test]
fn offline_reads_fall_back_and_writes_fail() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let created = store
        .create("u1", "todos", fields(json!({ "title": "cached" })))
        .unwrap();

    store.backend().set_offline(true);
    assert!(store.get_all("u1", "todos", None).unwrap().is_empty());
    assert!(store.get_by_id("u1", "todos", &created.id).unwrap().is_none());
    let write = store.create("u1", "todos", fields(json!({ "title": "lost" })));
    assert!(matches!(write, Err(StoreError::Unavailable(_))));

    store.backend().set_offline(false);
    assert_eq!(store.get_all("u1", "todos", None).unwrap().len(), 1);
}

#[test]
fn locked_sqlite_reads_fall_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lifehub.db");

    let conn = open_db(&path).unwrap();
    let store = DocumentStore::new(SqliteDocumentBackend::try_new(&conn).unwrap());
    let created = store
        .create("u1", "todos", fields(json!({ "title": "locked out" })))
        .unwrap();
    conn.busy_timeout(Duration::from_millis(50)).unwrap();

    let holder = open_db(&path).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    assert!(store.get_all("u1", "todos", None).unwrap().is_empty());
    assert!(store.get_by_id("u1", "todos", &created.id).unwrap().is_none());
    let write = store.create("u1", "todos", fields(json!({ "title": "blocked" })));
    assert!(matches!(write, Err(StoreError::Unavailable(_))));

    holder.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(store.get_all("u1", "todos", None).unwrap().len(), 1);
}

#[test]
fn boxed_backends_are_interchangeable() {
    let backends: Vec<Box<dyn DocumentBackend>> = vec![Box::new(MemoryDocumentBackend::new())];
    for backend in backends {
        let store = DocumentStore::new(backend);
        store
            .create("u1", "notes", fields(json!({ "body": "x" })))
            .unwrap();
        assert_eq!(store.get_all("u1", "notes", None).unwrap().len(), 1);
    }
}
