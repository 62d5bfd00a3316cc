//! Domain records for every life-management feature.
//!
//! # Responsibility
//! - Define the raw `Document` shape and the typed records decoded from it.
//! - Declare per-entity collection, owner field, defaults and patch types.
//!
//! # Invariants
//! - Records decode leniently: absent fields take their `Default` value.
//! - Links between records are plain string ids resolved by callers.

pub mod calendar;
pub mod document;
pub mod entity;
pub mod goal;
pub mod gratitude;
pub mod habit;
pub mod journal;
pub mod profile;
pub mod school;
pub mod todo;
pub mod vault;
pub mod workout;
