//! Habit catalog, per-user adoption and completion logs.
//!
//! # Invariants
//! - `UserHabit.habit_id` and `HabitLog.user_habit_id` are plain id links,
//!   never checked by the store.
//! - Counters on `UserHabit` are derived state maintained by the habit
//!   service through read-modify-write.

use crate::model::document::{Fields, CREATED_AT_FIELD};
use crate::model::entity::{fields_of, Entity, OwnerField};
use crate::store::query::OrderBy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
}

/// Habit definition created by one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Habit {
    pub id: String,
    pub created_by: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub icon: Option<String>,
    pub xp_reward: u32,
    pub frequency: HabitFrequency,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_reward: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<HabitFrequency>,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_reward: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<HabitFrequency>,
}

impl Entity for Habit {
    const COLLECTION: &'static str = "habits";
    const OWNER_FIELD: OwnerField = OwnerField::CreatedBy;
    type Draft = HabitDraft;
    type Patch = HabitPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({
            "category": "Health",
            "xp_reward": 10,
            "frequency": "daily",
        }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::asc("name"))
    }
}

/// One user's adoption of a habit, carrying streak counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserHabit {
    pub id: String,
    pub user_id: String,
    pub habit_id: String,
    pub streak_current: u32,
    pub streak_longest: u32,
    pub total_completions: u32,
    pub is_active: bool,
    pub last_completed: Option<NaiveDate>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

impl Default for UserHabit {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            habit_id: String::new(),
            streak_current: 0,
            streak_longest: 0,
            total_completions: 0,
            is_active: true,
            last_completed: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserHabitDraft {
    pub habit_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserHabitDraft {
    pub fn new(habit_id: impl Into<String>) -> Self {
        Self {
            habit_id: habit_id.into(),
            is_active: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserHabitPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_longest: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_completions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<Option<NaiveDate>>,
}

impl Entity for UserHabit {
    const COLLECTION: &'static str = "user_habits";
    type Draft = UserHabitDraft;
    type Patch = UserHabitPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({
            "streak_current": 0,
            "streak_longest": 0,
            "total_completions": 0,
            "is_active": true,
        }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::asc(CREATED_AT_FIELD))
    }
}

/// One completion of a user habit on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitLog {
    pub id: String,
    pub user_id: String,
    pub user_habit_id: String,
    pub habit_id: String,
    pub completed_date: Option<NaiveDate>,
    pub xp_earned: u32,
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitLogDraft {
    pub user_habit_id: String,
    pub habit_id: String,
    pub completed_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_earned: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_earned: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

impl Entity for HabitLog {
    const COLLECTION: &'static str = "habit_logs";
    type Draft = HabitLogDraft;
    type Patch = HabitLogPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "xp_earned": 0 }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::desc("completed_date"))
    }
}
