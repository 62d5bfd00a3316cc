//! Gratitude wall notes, owned through `created_by`.

use crate::model::document::Fields;
use crate::model::entity::{fields_of, Entity, OwnerField};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GratitudeNote {
    pub id: String,
    pub created_by: String,
    pub message: String,
    pub category: String,
    pub color: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GratitudeNoteDraft {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GratitudeNotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Entity for GratitudeNote {
    const COLLECTION: &'static str = "gratitude";
    const OWNER_FIELD: OwnerField = OwnerField::CreatedBy;
    type Draft = GratitudeNoteDraft;
    type Patch = GratitudeNotePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "category": "Motivation", "color": "yellow" }))
    }
}
