//! Per-user gamification profile (XP and level).

use crate::model::document::Fields;
use crate::model::entity::{fields_of, Entity};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub xp: u64,
    pub level: u32,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            display_name: None,
            xp: 0,
            level: 1,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfileDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Entity for UserProfile {
    const COLLECTION: &'static str = "profiles";
    type Draft = UserProfileDraft;
    type Patch = UserProfilePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "xp": 0, "level": 1 }))
    }
}
