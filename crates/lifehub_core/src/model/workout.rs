//! Workout tracker sessions.

use crate::model::document::Fields;
use crate::model::entity::{fields_of, Entity};
use crate::store::query::OrderBy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    #[default]
    Strength,
    Cardio,
    Flexibility,
    Sports,
    Other,
}

/// One exercise inside a workout session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exercise {
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub workout_type: WorkoutType,
    pub date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub calories: Option<u32>,
    pub exercises: Vec<Exercise>,
    pub notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl Entity for Workout {
    const COLLECTION: &'static str = "workouts";
    type Draft = WorkoutDraft;
    type Patch = WorkoutPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "workout_type": "strength", "exercises": [] }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::desc("date"))
    }
}
