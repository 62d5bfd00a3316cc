//! Typed per-entity CRUD facade.
//!
//! # Responsibility
//! - Apply entity defaults and the owner field on create.
//! - Translate flat equality criteria into store predicates.
//! - Decode documents into typed records, skipping unreadable ones on
//!   list reads.
//!
//! # Invariants
//! - Every read is constrained to the facade owner (path and owner field).
//! - `update` writes only the fields set on the typed patch.
//! - Facades perform no validation and no referential checks.

use crate::model::calendar::CalendarEvent;
use crate::model::document::{Document, Fields};
use crate::model::entity::{to_fields, Entity};
use crate::model::goal::Goal;
use crate::model::gratitude::GratitudeNote;
use crate::model::habit::{Habit, HabitLog, UserHabit};
use crate::model::journal::JournalEntry;
use crate::model::profile::UserProfile;
use crate::model::school::{Assignment, Course};
use crate::model::todo::Todo;
use crate::model::vault::VaultEntry;
use crate::model::workout::Workout;
use crate::store::backend::{merge_fields, DocumentBackend};
use crate::store::client::{DocumentStore, Subscription};
use crate::store::error::{StoreError, StoreResult};
use crate::store::query::Predicate;
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Flat `field == value` criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    fields: BTreeMap<String, Value>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one required field value.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn to_predicates(&self) -> Vec<Predicate> {
        self.fields
            .iter()
            .map(|(field, value)| Predicate::eq(field.clone(), value.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterCriteria {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

/// CRUD facade for one entity type and one owner.
pub struct EntityFacade<'s, B: DocumentBackend, E: Entity> {
    store: &'s DocumentStore<B>,
    owner: String,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, B: DocumentBackend, E: Entity> EntityFacade<'s, B, E> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
            _entity: PhantomData,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// All records of this owner in the entity's default order.
    pub fn list(&self) -> StoreResult<Vec<E>> {
        self.select(Vec::new())
    }

    /// Records whose fields equal every criteria value.
    pub fn filter(&self, criteria: &FilterCriteria) -> StoreResult<Vec<E>> {
        self.select(criteria.to_predicates())
    }

    /// Records matching arbitrary comparison predicates.
    pub fn select(&self, predicates: Vec<Predicate>) -> StoreResult<Vec<E>> {
        let mut scoped = vec![self.owner_predicate()];
        scoped.extend(predicates);
        let documents =
            self.store
                .get_filtered(&self.owner, E::COLLECTION, scoped, E::default_order())?;
        Ok(decode_readable(&documents, "entity_select"))
    }

    /// One record by id; `None` when absent or owned by someone else.
    pub fn get(&self, id: &str) -> StoreResult<Option<E>> {
        match self.store.get_by_id(&self.owner, E::COLLECTION, id)? {
            Some(document) if self.owns(&document) => decode(&document).map(Some),
            Some(_) => {
                warn!(
                    "event=entity_get module=service status=skipped collection={} id={} reason=owner_mismatch",
                    E::COLLECTION,
                    id
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Stores `draft` over the entity defaults and returns the new record.
    pub fn create(&self, draft: &E::Draft) -> StoreResult<E> {
        let mut fields = E::default_fields();
        merge_fields(&mut fields, &to_fields(draft)?);
        fields.insert(
            E::OWNER_FIELD.as_str().to_string(),
            Value::String(self.owner.clone()),
        );
        let document = self.store.create(&self.owner, E::COLLECTION, fields)?;
        decode(&document)
    }

    /// Merges the set fields of `patch` and returns the updated record.
    pub fn update(&self, id: &str, patch: &E::Patch) -> StoreResult<E> {
        let partial: Fields = to_fields(patch)?;
        self.store.update(&self.owner, E::COLLECTION, id, partial)?;
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            path: format!("users/{}/{}", self.owner, E::COLLECTION),
            id: id.to_string(),
        })
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(&self.owner, E::COLLECTION, id)
    }

    /// Typed `listen`: pushes decoded records matching `criteria`.
    ///
    /// Documents that fail to decode are skipped and logged.
    pub fn watch<F>(&self, criteria: &FilterCriteria, mut callback: F) -> StoreResult<Subscription>
    where
        F: FnMut(Vec<E>) + 'static,
        E: 'static,
    {
        let mut predicates = vec![self.owner_predicate()];
        predicates.extend(criteria.to_predicates());
        self.store.listen(
            &self.owner,
            E::COLLECTION,
            predicates,
            E::default_order(),
            move |documents: &[Document]| {
                callback(decode_readable(documents, "entity_watch"));
            },
        )
    }

    fn owner_predicate(&self) -> Predicate {
        Predicate::eq(E::OWNER_FIELD.as_str(), self.owner.clone())
    }

    fn owns(&self, document: &Document) -> bool {
        document.get(E::OWNER_FIELD.as_str()).and_then(Value::as_str) == Some(self.owner.as_str())
    }
}

/// Decodes every readable document; the rest are skipped and logged.
fn decode_readable<E: Entity>(documents: &[Document], event: &str) -> Vec<E> {
    documents
        .iter()
        .filter_map(|document| match decode::<E>(document) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    "event={} module=service status=skipped collection={} id={} error={}",
                    event,
                    E::COLLECTION,
                    document.id,
                    err
                );
                None
            }
        })
        .collect()
}

fn decode<E: Entity>(document: &Document) -> StoreResult<E> {
    document.decode::<E>().map_err(|err| {
        StoreError::InvalidData(format!(
            "{} document `{}` cannot be decoded: {err}",
            E::COLLECTION,
            document.id
        ))
    })
}

/// All entity facades for one owner.
pub struct OwnerScope<'s, B: DocumentBackend> {
    store: &'s DocumentStore<B>,
    owner: String,
}

impl<'s, B: DocumentBackend> OwnerScope<'s, B> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn store(&self) -> &'s DocumentStore<B> {
        self.store
    }

    pub fn facade<E: Entity>(&self) -> EntityFacade<'s, B, E> {
        EntityFacade::new(self.store, self.owner.clone())
    }

    pub fn todos(&self) -> EntityFacade<'s, B, Todo> {
        self.facade()
    }

    pub fn habits(&self) -> EntityFacade<'s, B, Habit> {
        self.facade()
    }

    pub fn user_habits(&self) -> EntityFacade<'s, B, UserHabit> {
        self.facade()
    }

    pub fn habit_logs(&self) -> EntityFacade<'s, B, HabitLog> {
        self.facade()
    }

    pub fn profiles(&self) -> EntityFacade<'s, B, UserProfile> {
        self.facade()
    }

    pub fn journal(&self) -> EntityFacade<'s, B, JournalEntry> {
        self.facade()
    }

    pub fn goals(&self) -> EntityFacade<'s, B, Goal> {
        self.facade()
    }

    pub fn gratitude(&self) -> EntityFacade<'s, B, GratitudeNote> {
        self.facade()
    }

    pub fn vault(&self) -> EntityFacade<'s, B, VaultEntry> {
        self.facade()
    }

    pub fn events(&self) -> EntityFacade<'s, B, CalendarEvent> {
        self.facade()
    }

    pub fn courses(&self) -> EntityFacade<'s, B, Course> {
        self.facade()
    }

    pub fn assignments(&self) -> EntityFacade<'s, B, Assignment> {
        self.facade()
    }

    pub fn workouts(&self) -> EntityFacade<'s, B, Workout> {
        self.facade()
    }
}

/// Collections served by [`OwnerScope`], in display order.
pub const COLLECTIONS: &[&str] = &[
    Todo::COLLECTION,
    Habit::COLLECTION,
    UserHabit::COLLECTION,
    HabitLog::COLLECTION,
    UserProfile::COLLECTION,
    JournalEntry::COLLECTION,
    Goal::COLLECTION,
    GratitudeNote::COLLECTION,
    VaultEntry::COLLECTION,
    CalendarEvent::COLLECTION,
    Course::COLLECTION,
    Assignment::COLLECTION,
    Workout::COLLECTION,
];
