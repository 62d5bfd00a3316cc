use lifehub_core::db::open_db_in_memory;
use lifehub_core::model::gratitude::{GratitudeNote, GratitudeNoteDraft};
use lifehub_core::model::journal::{JournalEntry, JournalEntryDraft, Mood};
use lifehub_core::model::todo::{Priority, Todo, TodoDraft, TodoPatch};
use lifehub_core::model::vault::{VaultEntryDraft, VaultEntryPatch};
use lifehub_core::model::workout::{Exercise, WorkoutDraft, WorkoutType};
use lifehub_core::model::goal::{GoalDraft, GoalPatch, GoalStatus};
use lifehub_core::service::todo_service::TodoService;
use lifehub_core::{
    DocumentStore, EntityFacade, FilterCriteria, MemoryDocumentBackend, OwnerScope,
    SqliteDocumentBackend, StoreError,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn todo_toggle_then_filter_returns_the_record() {
    let conn = open_db_in_memory().unwrap();
    let store = DocumentStore::new(SqliteDocumentBackend::try_new(&conn).unwrap());
    let todos = TodoService::new(&store, "u1");

    let created = todos.add(&TodoDraft::new("Buy milk")).unwrap();
    assert!(!created.completed);
    assert_eq!(created.priority, Priority::Medium);
    assert_eq!(created.user_id, "u1");
    assert!(created.created_at.is_some());

    let toggled = todos.toggle(&created.id).unwrap();
    assert!(toggled.completed);

    let facade: EntityFacade<'_, _, Todo> = EntityFacade::new(&store, "u1");
    let done = facade
        .filter(&FilterCriteria::new().eq("completed", true))
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, created.id);
    assert_eq!(done[0].title, "Buy milk");
}

#[test]
fn patch_writes_only_set_fields_and_can_clear_values() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let scope = OwnerScope::new(&store, "u1");
    let mut draft = TodoDraft::new("Dentist");
    draft.description = Some("call first".to_string());
    draft.priority = Some(Priority::High);
    let todo = scope.todos().create(&draft).unwrap();

    let patch = TodoPatch {
        description: Some(None),
        ..TodoPatch::default()
    };
    let updated = scope.todos().update(&todo.id, &patch).unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.title, "Dentist");
    assert_eq!(updated.created_at, todo.created_at);
}

#[test]
fn update_of_missing_record_is_not_found() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let result = OwnerScope::new(&store, "u1")
        .todos()
        .update("missing", &TodoPatch::completed(true));
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[test]
fn facades_apply_defaults_and_owner_fields() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let scope = OwnerScope::new(&store, "u1");

    let note = scope
        .gratitude()
        .create(&GratitudeNoteDraft {
            message: "Sunny walk".to_string(),
            ..GratitudeNoteDraft::default()
        })
        .unwrap();
    assert_eq!(note.created_by, "u1");
    assert_eq!(note.category, "Motivation");
    assert_eq!(note.color, "yellow");

    let goal = scope.goals().create(&GoalDraft::new("Run 10k")).unwrap();
    assert_eq!(goal.status, GoalStatus::Active);
    assert_eq!(goal.progress, 0);
    assert_eq!(goal.category, "Personal");
    let goal = scope
        .goals()
        .update(
            &goal.id,
            &GoalPatch {
                progress: Some(40),
                ..GoalPatch::default()
            },
        )
        .unwrap();
    assert_eq!(goal.progress, 40);

    let workout = scope
        .workouts()
        .create(&WorkoutDraft {
            name: "Legs".to_string(),
            exercises: Some(vec![Exercise {
                name: "Squat".to_string(),
                sets: Some(5),
                reps: Some(5),
                weight_kg: Some(80.0),
            }]),
            ..WorkoutDraft::default()
        })
        .unwrap();
    assert_eq!(workout.workout_type, WorkoutType::Strength);
    assert_eq!(workout.exercises.len(), 1);
}

#[test]
fn vault_entries_sort_by_site_and_toggle_favorite() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let vault = OwnerScope::new(&store, "u1").vault();
    for site in ["zulip", "amazon", "github"] {
        vault
            .create(&VaultEntryDraft {
                site_name: site.to_string(),
                username: "me".to_string(),
                secret: "hunter2".to_string(),
                ..VaultEntryDraft::default()
            })
            .unwrap();
    }

    let entries = vault.list().unwrap();
    let sites: Vec<&str> = entries.iter().map(|entry| entry.site_name.as_str()).collect();
    assert_eq!(sites, vec!["amazon", "github", "zulip"]);
    assert!(entries.iter().all(|entry| !entry.favorite));

    vault
        .update(
            &entries[1].id,
            &VaultEntryPatch {
                favorite: Some(true),
                ..VaultEntryPatch::default()
            },
        )
        .unwrap();
    let favorites = vault
        .filter(&FilterCriteria::new().eq("favorite", true))
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].site_name, "github");
}

#[test]
fn owners_never_see_each_others_records() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let alice = OwnerScope::new(&store, "alice");
    let bob = OwnerScope::new(&store, "bob");

    let todo = alice.todos().create(&TodoDraft::new("secret plan")).unwrap();
    assert!(bob.todos().list().unwrap().is_empty());
    assert!(bob.todos().get(&todo.id).unwrap().is_none());
    assert_eq!(alice.todos().list().unwrap().len(), 1);
}

#[test]
fn watch_pushes_decoded_records() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let notes: EntityFacade<'_, _, GratitudeNote> = EntityFacade::new(&store, "u1");
    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let subscription = notes
        .watch(&FilterCriteria::new(), move |records: Vec<GratitudeNote>| {
            sink.borrow_mut()
                .push(records.into_iter().map(|note| note.message).collect());
        })
        .unwrap();
    notes
        .create(&GratitudeNoteDraft {
            message: "Coffee".to_string(),
            ..GratitudeNoteDraft::default()
        })
        .unwrap();
    store.release(subscription);

    assert_eq!(
        *seen.borrow(),
        vec![Vec::<String>::new(), vec!["Coffee".to_string()]]
    );
}

#[test]
fn offline_facade_reads_are_empty() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let todos = OwnerScope::new(&store, "u1").todos();
    todos.create(&TodoDraft::new("before outage")).unwrap();

    store.backend().set_offline(true);
    assert!(todos.list().unwrap().is_empty());
    assert!(matches!(
        todos.create(&TodoDraft::new("during outage")),
        Err(StoreError::Unavailable(_))
    ));
}

fn raw_fields(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn legacy_records_do_not_break_list_reads() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let scope = OwnerScope::new(&store, "u1");
    scope
        .gratitude()
        .create(&GratitudeNoteDraft {
            message: "Fresh bread".to_string(),
            ..GratitudeNoteDraft::default()
        })
        .unwrap();
    scope
        .journal()
        .create(&JournalEntryDraft {
            content: "quiet day".to_string(),
            mood: Some(Mood::Good),
            ..JournalEntryDraft::default()
        })
        .unwrap();

    store
        .create(
            "u1",
            "gratitude",
            raw_fields(json!({ "created_by": "u1", "message": "legacy", "color": null })),
        )
        .unwrap();
    store
        .create(
            "u1",
            "journal",
            raw_fields(json!({ "user_id": "u1", "content": "odd", "mood": "happy" })),
        )
        .unwrap();

    let notes: Vec<GratitudeNote> = scope.gratitude().list().unwrap();
    let mut messages: Vec<&str> = notes.iter().map(|note| note.message.as_str()).collect();
    messages.sort_unstable();
    assert_eq!(messages, vec!["Fresh bread", "legacy"]);
    let legacy = notes.iter().find(|note| note.message == "legacy").unwrap();
    assert_eq!(legacy.color, "");

    let entries: Vec<JournalEntry> = scope.journal().list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "quiet day");
}

#[test]
fn get_ignores_records_carrying_another_owner() {
    let store = DocumentStore::new(MemoryDocumentBackend::new());
    let stray = store
        .create(
            "u1",
            "todos",
            raw_fields(json!({ "user_id": "u2", "title": "misfiled" })),
        )
        .unwrap();

    let todos = OwnerScope::new(&store, "u1").todos();
    assert!(todos.get(&stray.id).unwrap().is_none());
    assert!(todos.list().unwrap().is_empty());
}
