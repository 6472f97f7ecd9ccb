//! Cooldown Gate — per-character eligibility derived from the last
//! successful intervention and the frequency table.
//!
//! `CooldownLedger` is the orchestrator's per-character lock: it serialises
//! check → generate → record for one character and remembers the newest
//! recorded timestamp, so a stale profile snapshot cannot fire twice inside
//! one window.

use super::types::{CharacterState, CharacterTriggerProfile, InterventionFrequency};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Past this age a recorded intervention no longer affects any frequency.
pub const LONGEST_COOLDOWN: std::time::Duration = InterventionFrequency::Low.cooldown();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eligibility {
    pub eligible: bool,
    /// Set only when the character is waiting out a cooldown.
    pub cooldown_ends_at: Option<DateTime<Utc>>,
}

impl Eligibility {
    const ELIGIBLE: Self = Self {
        eligible: true,
        cooldown_ends_at: None,
    };
    const BLOCKED: Self = Self {
        eligible: false,
        cooldown_ends_at: None,
    };
}

/// Instant at which the profile's current cooldown ends, if it ever fired.
pub fn cooldown_ends_at(
    profile: &CharacterTriggerProfile,
    last: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let cooldown = chrono::Duration::from_std(profile.intervention_frequency.cooldown()).ok()?;
    last.map(|at| at + cooldown)
}

/// Check one profile against `now`.
pub fn check(profile: &CharacterTriggerProfile, now: DateTime<Utc>) -> Eligibility {
    check_with_last(profile, profile.last_intervention_at, now)
}

/// Same as [`check`] but with an explicit last-intervention timestamp.
pub fn check_with_last(
    profile: &CharacterTriggerProfile,
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Eligibility {
    if !profile.intervention_enabled {
        return Eligibility::BLOCKED;
    }
    match cooldown_ends_at(profile, last) {
        None => Eligibility::ELIGIBLE,
        Some(ends_at) if now >= ends_at => Eligibility::ELIGIBLE,
        Some(ends_at) => Eligibility {
            eligible: false,
            cooldown_ends_at: Some(ends_at),
        },
    }
}

/// Derived lifecycle state for display and diagnostics.
pub fn character_state(
    profile: &CharacterTriggerProfile,
    now: DateTime<Utc>,
    generating: bool,
) -> CharacterState {
    if !profile.intervention_enabled {
        CharacterState::Disabled
    } else if generating {
        CharacterState::Generating
    } else if check(profile, now).eligible {
        CharacterState::Idle
    } else {
        CharacterState::CooldownActive
    }
}

// ── Ledger ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CharacterSlot {
    /// Newest intervention this process recorded for the character.
    pub last_recorded: Option<DateTime<Utc>>,
}

impl CharacterSlot {
    /// Latest of the stored profile timestamp and what this process recorded.
    pub fn effective_last(&self, profile: &CharacterTriggerProfile) -> Option<DateTime<Utc>> {
        match (profile.last_intervention_at, self.last_recorded) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn record(&mut self, at: DateTime<Utc>) {
        self.last_recorded = Some(match self.last_recorded {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }
}

/// Per-character locks keyed by character id.
#[derive(Debug, Default)]
pub struct CooldownLedger {
    slots: std::sync::Mutex<HashMap<String, Arc<Mutex<CharacterSlot>>>>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, character_id: &str) -> Arc<Mutex<CharacterSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(character_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CharacterSlot::default())))
            .clone()
    }

    /// Wait for exclusive access to one character's slot.
    pub async fn lock(&self, character_id: &str) -> OwnedMutexGuard<CharacterSlot> {
        self.slot(character_id).lock_owned().await
    }

    /// Take the slot only if nobody holds it. `None` means a cycle for
    /// this character is in progress.
    pub fn try_lock(&self, character_id: &str) -> Option<OwnedMutexGuard<CharacterSlot>> {
        self.slot(character_id).try_lock_owned().ok()
    }

    /// Drop idle slots whose recorded intervention is older than the longest
    /// cooldown. Returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let horizon = chrono::Duration::from_std(LONGEST_COOLDOWN)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|_, slot| {
            // Held by a guard or a waiter.
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(slot) => slot.last_recorded.is_some_and(|at| at + horizon > now),
                Err(_) => true,
            }
        });
        before - slots.len()
    }

    /// Number of characters currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
