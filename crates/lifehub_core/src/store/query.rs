//! Predicate and ordering model shared by all document backends.
//!
//! # Responsibility
//! - Describe filters (`field <op> value`) and ordering independent of storage.
//! - Provide the in-process evaluator used by non-SQL backends.
//!
//! # Invariants
//! - Field names match `^[A-Za-z_][A-Za-z0-9_]*$`.
//! - Predicate values are scalars (null, bool, number, string).
//! - Evaluation mirrors SQLite `json_extract` semantics: missing fields are
//!   null, booleans are 0/1, arrays and objects compare as their JSON text,
//!   values of different type classes order as `null < number < text`.

use crate::model::document::Document;
use crate::store::error::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Comparison operator of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// One `field <op> value` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Comparison,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Eq, value)
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::NotEq, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Ge, value)
    }

    /// Evaluates this predicate against one document.
    pub fn matches(&self, doc: &Document) -> bool {
        let actual = doc.get(&self.field).filter(|value| !value.is_null());
        match (self.op, &self.value) {
            (Comparison::Eq, Value::Null) => actual.is_none(),
            (Comparison::NotEq, Value::Null) => actual.is_some(),
            (_, Value::Null) => false,
            (op, expected) => {
                let Some(actual) = actual else {
                    return false;
                };
                let ordering = compare_present(actual, expected);
                match op {
                    Comparison::Eq => ordering == Ordering::Equal,
                    Comparison::NotEq => ordering != Ordering::Equal,
                    Comparison::Lt => ordering == Ordering::Less,
                    Comparison::Le => ordering != Ordering::Greater,
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Ge => ordering != Ordering::Less,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Result ordering by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Filter plus ordering for one collection read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub predicates: Vec<Predicate>,
    pub order_by: Option<OrderBy>,
}

impl DocumentQuery {
    pub fn new(predicates: Vec<Predicate>, order_by: Option<OrderBy>) -> Self {
        Self {
            predicates,
            order_by,
        }
    }

    /// Rejects malformed field names and non-scalar predicate values.
    pub fn validate(&self) -> StoreResult<()> {
        for predicate in &self.predicates {
            validate_field_name(&predicate.field)?;
            if predicate.value.is_array() || predicate.value.is_object() {
                return Err(StoreError::InvalidQuery(format!(
                    "predicate on `{}` must compare against a scalar value",
                    predicate.field
                )));
            }
        }
        if let Some(order) = &self.order_by {
            validate_field_name(&order.field)?;
        }
        Ok(())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(doc))
    }

    /// Filters and orders documents. Ties keep their input order.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut selected: Vec<Document> = docs.into_iter().filter(|doc| self.matches(doc)).collect();
        if let Some(order) = &self.order_by {
            selected.sort_by(|left, right| {
                let ordering = compare_values(left.get(&order.field), right.get(&order.field));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        selected
    }
}

/// Checks that a field name is a plain top-level identifier.
pub fn validate_field_name(field: &str) -> StoreResult<()> {
    if FIELD_NAME_RE.is_match(field) {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!(
            "unsupported field name `{field}`"
        )))
    }
}

/// Total order over optional JSON values, missing treated as null.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|value| !value.is_null());
    let right = right.filter(|value| !value.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => compare_present(left, right),
    }
}

fn compare_present(left: &Value, right: &Value) -> Ordering {
    let class_order = type_class(left).cmp(&type_class(right));
    if class_order != Ordering::Equal {
        return class_order;
    }

    if let (Some(left), Some(right)) = (as_integer(left), as_integer(right)) {
        return left.cmp(&right);
    }
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => as_text(left).cmp(&as_text(right)),
    }
}

/// Values in `i64` range compare exactly; SQLite reads larger ones as REAL.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn type_class(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) | Value::Number(_) => 1,
        Value::String(_) | Value::Array(_) | Value::Object(_) => 2,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
