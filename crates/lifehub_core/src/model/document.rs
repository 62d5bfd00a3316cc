//! Schemaless document shape shared by every store backend.
//!
//! # Responsibility
//! - Define the raw record exchanged between the store and entity facades.
//! - Define the owner-scoped collection path `users/{owner}/{collection}`.
//!
//! # Invariants
//! - `id` is assigned by the backend and never stored inside `fields`.
//! - Owner and collection segments are non-blank and contain no `/`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Backend-assigned document identifier.
pub type DocumentId = String;

/// Field map of one document.
pub type Fields = serde_json::Map<String, Value>;

/// Field holding the creation timestamp (epoch milliseconds).
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field holding the last-write timestamp (epoch milliseconds).
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Key used for the document id when a document is decoded into a record.
pub const ID_FIELD: &str = "id";

/// One stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns one field value, `None` when absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn created_at(&self) -> Option<i64> {
        self.get(CREATED_AT_FIELD).and_then(Value::as_i64)
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.get(UPDATED_AT_FIELD).and_then(Value::as_i64)
    }

    /// Decodes this document into a typed record, injecting `id`.
    ///
    /// Explicit `null` fields decode as absent, so record defaults apply.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields: Fields = self
            .fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Owner-scoped collection address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    owner: String,
    collection: String,
}

impl CollectionPath {
    /// Builds a path, rejecting blank segments and segments containing `/`.
    pub fn new(owner: &str, collection: &str) -> Result<Self, String> {
        let owner = normalize_segment("owner", owner)?;
        let collection = normalize_segment("collection", collection)?;
        Ok(Self { owner, collection })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "users/{}/{}", self.owner, self.collection)
    }
}

fn normalize_segment(label: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} must not be blank"));
    }
    if trimmed.contains('/') {
        return Err(format!("{label} must not contain `/`, got `{trimmed}`"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{CollectionPath, Document, Fields};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn path_renders_owner_scoped_address() {
        let path = CollectionPath::new(" user-1 ", "todos").unwrap();
        assert_eq!(path.to_string(), "users/user-1/todos");
    }

    #[test]
    fn path_rejects_blank_and_nested_segments() {
        assert!(CollectionPath::new("", "todos").is_err());
        assert!(CollectionPath::new("user-1", "a/b").is_err());
    }

    #[test]
    fn decode_injects_document_id() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("walk"));
        let doc = Document::new("doc-1", fields);

        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "doc-1");
        assert_eq!(named.name, "walk");
    }

    #[test]
    fn decode_treats_null_fields_as_absent() {
        #[derive(Debug, Deserialize)]
        struct Tagged {
            #[serde(default)]
            tags: Vec<String>,
        }

        let mut fields = Fields::new();
        fields.insert("tags".to_string(), json!(null));
        let doc = Document::new("doc-2", fields.clone());

        let tagged: Tagged = doc.decode().unwrap();
        assert!(tagged.tags.is_empty());
        assert_eq!(doc.fields, fields);
    }
}
