//! Password vault entries.
//!
//! `secret` is stored as given; encoding or encryption of the value is the
//! caller's concern.

use crate::model::document::Fields;
use crate::model::entity::{fields_of, Entity};
use crate::store::query::OrderBy;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultEntry {
    pub id: String,
    pub user_id: String,
    pub site_name: String,
    pub username: String,
    pub secret: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub category: String,
    pub favorite: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaultEntryDraft {
    pub site_name: String,
    pub username: String,
    pub secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaultEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

impl Entity for VaultEntry {
    const COLLECTION: &'static str = "vault";
    type Draft = VaultEntryDraft;
    type Patch = VaultEntryPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_fields() -> Fields {
        fields_of(json!({ "category": "Other", "favorite": false }))
    }

    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::asc("site_name"))
    }
}
