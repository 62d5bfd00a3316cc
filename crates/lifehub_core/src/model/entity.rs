//! Entity contract shared by every typed facade.
//!
//! # Responsibility
//! - Bind a record type to its collection, owner field and defaults.
//! - Pair each record with a create-time draft and a typed partial update.
//!
//! # Invariants
//! - `default_fields` never contains `id`, timestamps or the owner field.
//! - `Draft` and `Patch` serialize only the fields the caller set.

use crate::model::document::{Fields, CREATED_AT_FIELD};
use crate::store::query::OrderBy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Attribute used to scope records to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerField {
    UserId,
    CreatedBy,
}

impl OwnerField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::CreatedBy => "created_by",
        }
    }
}

/// Typed record stored in one document collection.
pub trait Entity: DeserializeOwned + Clone {
    /// Collection name under `users/{owner}/`.
    const COLLECTION: &'static str;
    const OWNER_FIELD: OwnerField = OwnerField::UserId;

    /// Create-time input. Unset optional fields fall back to defaults.
    type Draft: Serialize;
    /// Partial update. Only set fields are written.
    type Patch: Serialize;

    fn id(&self) -> &str;

    /// Field values applied before the draft on create.
    fn default_fields() -> Fields {
        Fields::new()
    }

    /// Ordering used by `list` and `filter`.
    fn default_order() -> Option<OrderBy> {
        Some(OrderBy::desc(CREATED_AT_FIELD))
    }
}

/// Serializes a draft or patch into a field map.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Fields::new()),
        other => Err(serde::ser::Error::custom(format!(
            "expected a field map, got `{other}`"
        ))),
    }
}

/// Builds a field map from a `json!` object literal.
pub fn fields_of(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
