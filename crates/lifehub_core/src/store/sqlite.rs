//! SQLite-backed document backend.
//!
//! # Responsibility
//! - Persist owner-scoped documents as JSON rows in the `documents` table.
//! - Translate `DocumentQuery` predicates into `json_extract` SQL.
//!
//! # Invariants
//! - Every statement binds owner, collection, JSON paths and values as
//!   parameters; field names are validated before path construction.
//! - Ties in ordered reads fall back to insertion order (`rowid ASC`).
//! - Read paths reject persisted rows whose `data` is not a JSON object.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::document::{CollectionPath, Document, Fields, CREATED_AT_FIELD, UPDATED_AT_FIELD};
use crate::store::backend::{merge_fields, new_document_id, DocumentBackend};
use crate::store::error::{StoreError, StoreResult};
use crate::store::query::{Comparison, Direction, DocumentQuery};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::Value;

const DOCUMENTS_TABLE: &str = "documents";
const DOCUMENTS_COLUMNS: &[&str] = &[
    "owner_id",
    "collection",
    "doc_id",
    "data",
    "created_at",
    "updated_at",
];

/// Document backend over a migrated SQLite connection.
pub struct SqliteDocumentBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentBackend<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema
    ///   does not match what this backend reads and writes.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        if !table_exists(conn, DOCUMENTS_TABLE)? {
            return Err(StoreError::MissingRequiredTable(DOCUMENTS_TABLE));
        }
        let columns = table_columns(conn, DOCUMENTS_TABLE)?;
        for &column in DOCUMENTS_COLUMNS {
            if !columns.iter().any(|existing| existing == column) {
                return Err(StoreError::MissingRequiredColumn {
                    table: DOCUMENTS_TABLE,
                    column,
                });
            }
        }

        Ok(Self { conn })
    }
}

impl DocumentBackend for SqliteDocumentBackend<'_> {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn insert(&self, path: &CollectionPath, fields: &Fields) -> StoreResult<Document> {
        let id = new_document_id();
        let data = serde_json::to_string(fields)?;
        let now = chrono::Utc::now().timestamp_millis();
        let created_at = timestamp_or(fields, CREATED_AT_FIELD, now);
        let updated_at = timestamp_or(fields, UPDATED_AT_FIELD, created_at);

        self.conn.execute(
            "INSERT INTO documents (
                owner_id,
                collection,
                doc_id,
                data,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                path.owner(),
                path.collection(),
                id.as_str(),
                data,
                created_at,
                updated_at
            ],
        )?;

        Ok(Document::new(id, fields.clone()))
    }

    fn query(&self, path: &CollectionPath, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        query.validate()?;

        let mut sql = String::from(
            "SELECT doc_id, data
             FROM documents
             WHERE owner_id = ?
               AND collection = ?",
        );
        let mut bind_values: Vec<SqlValue> = vec![
            SqlValue::Text(path.owner().to_string()),
            SqlValue::Text(path.collection().to_string()),
        ];

        for predicate in &query.predicates {
            bind_values.push(SqlValue::Text(json_path(&predicate.field)));
            match (predicate.op, &predicate.value) {
                (Comparison::Eq, Value::Null) => {
                    sql.push_str(" AND json_extract(data, ?) IS NULL");
                }
                (Comparison::NotEq, Value::Null) => {
                    sql.push_str(" AND json_extract(data, ?) IS NOT NULL");
                }
                (op, value) => {
                    sql.push_str(" AND json_extract(data, ?) ");
                    sql.push_str(op.as_sql());
                    sql.push_str(" ?");
                    bind_values.push(json_to_sql(value));
                }
            }
        }

        match &query.order_by {
            Some(order) => {
                sql.push_str(" ORDER BY json_extract(data, ?) ");
                sql.push_str(match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                });
                sql.push_str(", rowid ASC");
                bind_values.push(SqlValue::Text(json_path(&order.field)));
            }
            None => sql.push_str(" ORDER BY rowid ASC"),
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn fetch(&self, path: &CollectionPath, id: &str) -> StoreResult<Option<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, data
             FROM documents
             WHERE owner_id = ?1
               AND collection = ?2
               AND doc_id = ?3;",
        )?;

        let mut rows = stmt.query(params![path.owner(), path.collection(), id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }

        Ok(None)
    }

    fn merge(&self, path: &CollectionPath, id: &str, partial: &Fields) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT data
                 FROM documents
                 WHERE owner_id = ?1
                   AND collection = ?2
                   AND doc_id = ?3;",
                params![path.owner(), path.collection(), id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(existing) = existing else {
            return Err(StoreError::NotFound {
                path: path.to_string(),
                id: id.to_string(),
            });
        };

        let mut fields = parse_fields(&existing, id)?;
        merge_fields(&mut fields, partial);
        let updated_at = timestamp_or(
            &fields,
            UPDATED_AT_FIELD,
            chrono::Utc::now().timestamp_millis(),
        );

        tx.execute(
            "UPDATE documents
             SET
                data = ?4,
                updated_at = ?5
             WHERE owner_id = ?1
               AND collection = ?2
               AND doc_id = ?3;",
            params![
                path.owner(),
                path.collection(),
                id,
                serde_json::to_string(&fields)?,
                updated_at
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn remove(&self, path: &CollectionPath, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents
             WHERE owner_id = ?1
               AND collection = ?2
               AND doc_id = ?3;",
            params![path.owner(), path.collection(), id],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                path: path.to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<Document> {
    let id: String = row.get("doc_id")?;
    let data: String = row.get("data")?;
    let fields = parse_fields(&data, &id)?;
    Ok(Document::new(id, fields))
}

fn parse_fields(data: &str, id: &str) -> StoreResult<Fields> {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(StoreError::InvalidData(format!(
            "documents.data for `{id}` is not a JSON object"
        ))),
        Err(err) => Err(StoreError::InvalidData(format!(
            "documents.data for `{id}` is not valid JSON: {err}"
        ))),
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn timestamp_or(fields: &Fields, key: &str, fallback: i64) -> i64 {
    fields.get(key).and_then(Value::as_i64).unwrap_or(fallback)
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
