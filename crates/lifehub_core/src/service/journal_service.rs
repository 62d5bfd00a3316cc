//! Journal writing and mood reporting.
//!
//! # Invariants
//! - Stored entries always carry an `entry_date`.
//! - Tags are trimmed, lowercased and deduplicated in first-seen order.

use crate::derive::mood::{average_mood, most_common, tally_by};
use crate::model::journal::{JournalEntry, JournalEntryDraft, Mood};
use crate::service::facade::EntityFacade;
use crate::service::{require_text, ServiceError, ServiceResult};
use crate::store::backend::DocumentBackend;
use crate::store::client::DocumentStore;
use crate::store::query::Predicate;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Mood statistics over an inclusive date range.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodSummary {
    /// Entries in range, newest first.
    pub entries: Vec<JournalEntry>,
    pub average: Option<Mood>,
    pub most_common: Option<Mood>,
    pub tally: BTreeMap<Mood, usize>,
}

pub struct JournalService<'s, B: DocumentBackend> {
    entries: EntityFacade<'s, B, JournalEntry>,
}

impl<'s, B: DocumentBackend> JournalService<'s, B> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>) -> Self {
        Self {
            entries: EntityFacade::new(store, owner),
        }
    }

    /// Stores an entry; a missing `entry_date` becomes `today`.
    pub fn write(&self, draft: &JournalEntryDraft, today: NaiveDate) -> ServiceResult<JournalEntry> {
        require_text("journal content", &draft.content)?;
        let mut draft = draft.clone();
        draft.entry_date.get_or_insert(today);
        if let Some(tags) = draft.tags.take() {
            draft.tags = Some(normalize_tags(tags));
        }
        Ok(self.entries.create(&draft)?)
    }

    /// Entries with `from <= entry_date <= to`.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<Vec<JournalEntry>> {
        if from > to {
            return Err(ServiceError::InvalidInput(format!(
                "date range is reversed: {from} > {to}"
            )));
        }
        Ok(self.entries.select(vec![
            Predicate::ge("entry_date", from.to_string()),
            Predicate::le("entry_date", to.to_string()),
        ])?)
    }

    pub fn mood_summary(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<MoodSummary> {
        let entries = self.between(from, to)?;
        let tally = tally_by(&entries, |entry| entry.mood);
        Ok(MoodSummary {
            average: average_mood(entries.iter().map(|entry| entry.mood)),
            most_common: most_common(&tally),
            tally,
            entries,
        })
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
