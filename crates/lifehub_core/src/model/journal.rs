//! Journal entries and the five-point mood scale.

use crate::model::document::Fields;
use crate::model::entity::{fields_of, Entity};
use crate::store::query::OrderBy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Ordinal mood scale, worst to best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Awful,
    Bad,
    #[default]
    Okay,
    Good,
    Great,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Awful, Mood::Bad, Mood::Okay, Mood::Good, Mood::Great];

    /// Zero-based position on the scale.
    pub fn index(self) -> usize {
        match self {
            Self::Awful => 0,
            Self::Bad => 1,
            Self::Okay => 2,
            Self::Good => 3,
            Self::Great => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Awful => "awful",
            Self::Bad => "bad",
            Self::Okay => "okay",
            Self::Good => "good",
            Self::Great => "great",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub content: String,
    pub mood: Mood,
    pub entry_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalEntryDraft {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Entity for JournalEntry {
    const COLLECTION: &'static str = "journal";
    type Draft = JournalEntryDraft;
    type Patch = JournalEntryPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "mood": "okay", "tags": [] }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::desc("entry_date"))
    }
}
