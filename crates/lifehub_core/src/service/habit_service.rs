//! Habit tracking use-cases: adoption, daily completion, board, reset.
//!
//! # Responsibility
//! - Write completion logs and keep `UserHabit` counters in step.
//! - Award XP through the profile service on every new completion.
//! - Assemble the habit board with joins built once per load.
//! - Cascade-delete all habit progress of the owner.
//!
//! # Invariants
//! - At most one log per user habit per calendar day is written here.
//! - `reset_all` deletes logs first, then user habits, then resets the
//!   profile. It does not roll back; a failure reports what was done.

use crate::derive::index::{group_by, IdIndex};
use crate::derive::progress::completion_rate;
use crate::derive::streak::{advance_streak, current_streak, longest_streak, StreakCounters};
use crate::model::habit::{
    Habit, HabitDraft, HabitLog, HabitLogDraft, UserHabit, UserHabitDraft, UserHabitPatch,
};
use crate::service::facade::{EntityFacade, FilterCriteria};
use crate::service::profile_service::{ProfileService, XpAward};
use crate::service::{require_text, ServiceError, ServiceResult};
use crate::store::backend::DocumentBackend;
use crate::store::client::DocumentStore;
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tunables for streaks and XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitSettings {
    pub lookback_days: u32,
    /// XP granted when the habit definition cannot be resolved.
    pub xp_per_completion: u32,
}

impl Default for HabitSettings {
    fn default() -> Self {
        Self {
            lookback_days: crate::derive::streak::DEFAULT_LOOKBACK_DAYS,
            xp_per_completion: 10,
        }
    }
}

/// Outcome of `complete_today`.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Completed {
        log: HabitLog,
        user_habit: UserHabit,
        award: XpAward,
    },
    /// A log already exists for the day; nothing was written.
    AlreadyCompleted { user_habit: UserHabit },
}

/// One row of the habit board.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitCard {
    pub user_habit: UserHabit,
    /// `None` when the linked definition no longer exists.
    pub habit: Option<Habit>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completed_today: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitBoard {
    pub cards: Vec<HabitCard>,
    pub completed_today: usize,
    /// Percent of active habits completed today.
    pub completion_rate: u32,
}

/// Progress made by `reset_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub logs_deleted: usize,
    pub user_habits_deleted: usize,
    pub profile_reset: bool,
}

/// `reset_all` stopped part-way.
#[derive(Debug)]
pub struct ResetError {
    /// Work completed before the failure; not rolled back.
    pub report: ResetReport,
    pub cause: ServiceError,
}

impl Display for ResetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "habit reset incomplete after {} logs and {} user habits: {}",
            self.report.logs_deleted, self.report.user_habits_deleted, self.cause
        )
    }
}

impl Error for ResetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

pub struct HabitService<'s, B: DocumentBackend> {
    habits: EntityFacade<'s, B, Habit>,
    user_habits: EntityFacade<'s, B, UserHabit>,
    logs: EntityFacade<'s, B, HabitLog>,
    profiles: ProfileService<'s, B>,
    settings: HabitSettings,
}

impl<'s, B: DocumentBackend> HabitService<'s, B> {
    pub fn new(
        store: &'s DocumentStore<B>,
        profiles: ProfileService<'s, B>,
        owner: impl Into<String>,
        settings: HabitSettings,
    ) -> Self {
        let owner = owner.into();
        Self {
            habits: EntityFacade::new(store, owner.clone()),
            user_habits: EntityFacade::new(store, owner.clone()),
            logs: EntityFacade::new(store, owner),
            profiles,
            settings,
        }
    }

    pub fn profiles(&self) -> &ProfileService<'s, B> {
        &self.profiles
    }

    /// Creates a habit definition.
    pub fn define_habit(&self, draft: &HabitDraft) -> ServiceResult<Habit> {
        require_text("habit name", &draft.name)?;
        Ok(self.habits.create(draft)?)
    }

    /// Starts tracking `habit_id`. Adopting twice returns the existing record.
    pub fn adopt_habit(&self, habit_id: &str) -> ServiceResult<UserHabit> {
        if self.habits.get(habit_id)?.is_none() {
            return Err(ServiceError::not_found("habit", habit_id));
        }
        let existing = self
            .user_habits
            .filter(&FilterCriteria::new().eq("habit_id", habit_id))?;
        if let Some(user_habit) = existing.into_iter().next() {
            return Ok(user_habit);
        }
        Ok(self.user_habits.create(&UserHabitDraft::new(habit_id))?)
    }

    /// Logs a completion of `user_habit_id` on `today`.
    pub fn complete_today(&self, user_habit_id: &str, today: NaiveDate) -> ServiceResult<Completion> {
        let user_habit = self
            .user_habits
            .get(user_habit_id)?
            .ok_or_else(|| ServiceError::not_found("user habit", user_habit_id))?;

        let logged_today = self.logs.filter(
            &FilterCriteria::new()
                .eq("user_habit_id", user_habit_id)
                .eq("completed_date", today.to_string()),
        )?;
        if !logged_today.is_empty() {
            return Ok(Completion::AlreadyCompleted { user_habit });
        }

        let xp = match self.habits.get(&user_habit.habit_id)? {
            Some(habit) if habit.xp_reward > 0 => habit.xp_reward,
            _ => self.settings.xp_per_completion,
        };
        let log = self.logs.create(&HabitLogDraft {
            user_habit_id: user_habit.id.clone(),
            habit_id: user_habit.habit_id.clone(),
            completed_date: today,
            xp_earned: Some(xp),
            note: None,
        })?;

        let counters = advance_streak(
            StreakCounters {
                current: user_habit.streak_current,
                longest: user_habit.streak_longest,
                total_completions: user_habit.total_completions,
                last_completed: user_habit.last_completed,
            },
            today,
        );
        let user_habit = self.user_habits.update(
            &user_habit.id,
            &UserHabitPatch {
                streak_current: Some(counters.current),
                streak_longest: Some(counters.longest),
                total_completions: Some(counters.total_completions),
                last_completed: Some(counters.last_completed),
                ..UserHabitPatch::default()
            },
        )?;
        let award = self.profiles.award_xp(u64::from(xp))?;

        info!(
            "event=habit_complete module=service status=ok user_habit={} date={} xp={}",
            user_habit.id, today, xp
        );
        Ok(Completion::Completed {
            log,
            user_habit,
            award,
        })
    }

    /// Active user habits with their definitions and log-derived streaks.
    pub fn board(&self, today: NaiveDate) -> ServiceResult<HabitBoard> {
        let habits = self.habits.list()?;
        let user_habits: Vec<UserHabit> = self
            .user_habits
            .list()?
            .into_iter()
            .filter(|user_habit| user_habit.is_active)
            .collect();
        let logs = self.logs.list()?;

        let habit_index = IdIndex::build(&habits);
        let logs_by_user_habit = group_by(&logs, |log| log.user_habit_id.as_str());

        let cards: Vec<HabitCard> = user_habits
            .iter()
            .map(|user_habit| {
                let dates: Vec<NaiveDate> = logs_by_user_habit
                    .get(user_habit.id.as_str())
                    .map(|logs| logs.iter().filter_map(|log| log.completed_date).collect())
                    .unwrap_or_default();
                HabitCard {
                    user_habit: user_habit.clone(),
                    habit: habit_index.get(&user_habit.habit_id).cloned(),
                    current_streak: current_streak(
                        dates.iter().copied(),
                        today,
                        self.settings.lookback_days,
                    ),
                    longest_streak: longest_streak(dates.iter().copied()),
                    completed_today: dates.contains(&today),
                }
            })
            .collect();

        let completed_today = cards.iter().filter(|card| card.completed_today).count();
        Ok(HabitBoard {
            completion_rate: completion_rate(completed_today, cards.len()),
            completed_today,
            cards,
        })
    }

    /// Deletes every habit log and user habit of the owner, then resets
    /// the profile to level 1.
    pub fn reset_all(&self) -> Result<ResetReport, ResetError> {
        let mut report = ResetReport::default();
        info!(
            "event=habit_reset module=service status=start owner={}",
            self.logs.owner()
        );

        let result = self.run_reset(&mut report);
        match result {
            Ok(()) => {
                info!(
                    "event=habit_reset module=service status=ok owner={} logs={} user_habits={}",
                    self.logs.owner(),
                    report.logs_deleted,
                    report.user_habits_deleted
                );
                Ok(report)
            }
            Err(cause) => {
                error!(
                    "event=habit_reset module=service status=error owner={} logs={} user_habits={} profile_reset={} error={}",
                    self.logs.owner(),
                    report.logs_deleted,
                    report.user_habits_deleted,
                    report.profile_reset,
                    cause
                );
                Err(ResetError { report, cause })
            }
        }
    }

    fn run_reset(&self, report: &mut ResetReport) -> ServiceResult<()> {
        for log in self.logs.list()? {
            self.logs.delete(&log.id)?;
            report.logs_deleted += 1;
        }
        for user_habit in self.user_habits.list()? {
            self.user_habits.delete(&user_habit.id)?;
            report.user_habits_deleted += 1;
        }
        self.profiles.reset_progress()?;
        report.profile_reset = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, HabitService, HabitSettings};
    use crate::derive::progress::LevelTable;
    use crate::model::habit::HabitDraft;
    use crate::service::profile_service::ProfileService;
    use crate::service::ServiceError;
    use crate::store::client::DocumentStore;
    use crate::store::memory::MemoryDocumentBackend;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn service(store: &DocumentStore<MemoryDocumentBackend>) -> HabitService<'_, MemoryDocumentBackend> {
        let profiles = ProfileService::new(store, "u1", LevelTable::default());
        HabitService::new(store, profiles, "u1", HabitSettings::default())
    }

    #[test]
    fn blank_habit_name_is_rejected() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let err = service(&store)
            .define_habit(&HabitDraft::new("  "))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn adopting_unknown_habit_is_not_found() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let err = service(&store).adopt_habit("missing").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn second_completion_on_same_day_writes_nothing() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let habits = service(&store);
        let habit = habits.define_habit(&HabitDraft::new("Read")).unwrap();
        let user_habit = habits.adopt_habit(&habit.id).unwrap();

        let first = habits.complete_today(&user_habit.id, day(3)).unwrap();
        assert!(matches!(first, Completion::Completed { .. }));
        let second = habits.complete_today(&user_habit.id, day(3)).unwrap();
        match second {
            Completion::AlreadyCompleted { user_habit } => {
                assert_eq!(user_habit.total_completions, 1)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(habits.profiles().ensure_profile().unwrap().xp, 10);
    }
}
