//! Derived-state computations.
//!
//! # Responsibility
//! - Fold loaded records into view values (streaks, rates, levels,
//!   averages, join indexes).
//!
//! # Invariants
//! - Every function is pure: no store access, no clock reads. Callers pass
//!   `today` explicitly.

pub mod index;
pub mod mood;
pub mod progress;
pub mod streak;
