//! XP and level bookkeeping on the user profile.
//!
//! # Invariants
//! - One profile per owner; `ensure_profile` creates it lazily.
//! - Stored `level` always equals the level table's level for stored `xp`
//!   after any write made here.

use crate::derive::progress::{LevelProgress, LevelTable};
use crate::model::profile::{UserProfile, UserProfileDraft, UserProfilePatch};
use crate::service::facade::EntityFacade;
use crate::service::{ServiceError, ServiceResult};
use crate::store::backend::DocumentBackend;
use crate::store::client::DocumentStore;
use log::info;

/// Result of one XP award.
#[derive(Debug, Clone, PartialEq)]
pub struct XpAward {
    pub profile: UserProfile,
    pub previous_level: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.profile.level > self.previous_level
    }
}

pub struct ProfileService<'s, B: DocumentBackend> {
    profiles: EntityFacade<'s, B, UserProfile>,
    levels: LevelTable,
}

impl<'s, B: DocumentBackend> ProfileService<'s, B> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>, levels: LevelTable) -> Self {
        Self {
            profiles: EntityFacade::new(store, owner),
            levels,
        }
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    /// Returns the owner's profile, creating a level-1 profile when absent.
    pub fn ensure_profile(&self) -> ServiceResult<UserProfile> {
        if let Some(profile) = self.profiles.list()?.into_iter().next() {
            return Ok(profile);
        }
        let profile = self.profiles.create(&UserProfileDraft::default())?;
        info!(
            "event=profile_create module=service status=ok owner={} id={}",
            self.profiles.owner(),
            profile.id
        );
        Ok(profile)
    }

    /// Adds `amount` XP and recomputes the level.
    pub fn award_xp(&self, amount: u64) -> ServiceResult<XpAward> {
        let profile = self.ensure_profile()?;
        let xp = profile.xp.saturating_add(amount);
        let level = self.levels.level_for_xp(xp);
        let updated = self.write_progress(&profile.id, xp, level)?;
        if level > profile.level {
            info!(
                "event=level_up module=service status=ok owner={} level={}",
                self.profiles.owner(),
                level
            );
        }
        Ok(XpAward {
            profile: updated,
            previous_level: profile.level,
        })
    }

    /// Sets XP to 0 and level to 1.
    pub fn reset_progress(&self) -> ServiceResult<UserProfile> {
        let profile = self.ensure_profile()?;
        self.write_progress(&profile.id, 0, 1)
    }

    /// Level band position of the current XP.
    pub fn progress(&self) -> ServiceResult<LevelProgress> {
        let profile = self.ensure_profile()?;
        Ok(self.levels.progress(profile.xp))
    }

    fn write_progress(&self, id: &str, xp: u64, level: u32) -> ServiceResult<UserProfile> {
        let patch = UserProfilePatch {
            xp: Some(xp),
            level: Some(level),
            ..UserProfilePatch::default()
        };
        let updated = self.profiles.update(id, &patch)?;
        if updated.xp != xp || updated.level != level {
            return Err(ServiceError::InconsistentState(
                "profile read-back does not match written progress",
            ));
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::ProfileService;
    use crate::derive::progress::LevelTable;
    use crate::store::client::DocumentStore;
    use crate::store::memory::MemoryDocumentBackend;

    fn levels() -> LevelTable {
        LevelTable::new(vec![0, 100, 250]).unwrap()
    }

    #[test]
    fn ensure_profile_is_idempotent() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let service = ProfileService::new(&store, "u1", levels());
        let first = service.ensure_profile().unwrap();
        let second = service.ensure_profile().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.level, 1);
        assert_eq!(first.xp, 0);
    }

    #[test]
    fn award_xp_recomputes_level() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let service = ProfileService::new(&store, "u1", levels());
        let award = service.award_xp(90).unwrap();
        assert!(!award.leveled_up());
        let award = service.award_xp(20).unwrap();
        assert!(award.leveled_up());
        assert_eq!(award.profile.xp, 110);
        assert_eq!(award.profile.level, 2);
    }

    #[test]
    fn reset_returns_to_level_one() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let service = ProfileService::new(&store, "u1", levels());
        service.award_xp(300).unwrap();
        let profile = service.reset_progress().unwrap();
        assert_eq!((profile.xp, profile.level), (0, 1));
    }
}
