//! Day-based streak computations over habit logs.
//!
//! # Invariants
//! - Dates are calendar days; multiple logs on one day count once.
//! - `current_streak` looks back at most `lookback_days` days, today
//!   included, and stops at the first day without a log.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Lookback window used when no configuration overrides it.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Counts consecutive logged days ending at `today`.
///
/// Returns 0 when `today` itself has no log or no dates are given.
pub fn current_streak<I>(dates: I, today: NaiveDate, lookback_days: u32) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let logged: HashSet<NaiveDate> = dates.into_iter().collect();
    if logged.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut day = today;
    for _ in 0..lookback_days {
        if !logged.contains(&day) {
            break;
        }
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Length of the longest run of consecutive logged days.
pub fn longest_streak<I>(dates: I) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous.and_then(|prev| prev.succ_opt()) {
            Some(expected) if expected == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// Stored counters of one user habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakCounters {
    pub current: u32,
    pub longest: u32,
    pub total_completions: u32,
    pub last_completed: Option<NaiveDate>,
}

/// Applies one completion on `day` to stored counters.
///
/// - Same day as the last completion: unchanged.
/// - Day right after the last completion: current streak grows by one.
/// - Day before the last completion: only the total grows.
/// - Any other gap: current streak restarts at 1.
pub fn advance_streak(counters: StreakCounters, day: NaiveDate) -> StreakCounters {
    let mut next = counters;
    match counters.last_completed {
        Some(last) if last == day => return counters,
        Some(last) if last > day => {
            next.total_completions += 1;
            return next;
        }
        Some(last) if last.succ_opt() == Some(day) => next.current += 1,
        _ => next.current = 1,
    }

    next.longest = next.longest.max(next.current);
    next.total_completions += 1;
    next.last_completed = Some(day);
    next
}
