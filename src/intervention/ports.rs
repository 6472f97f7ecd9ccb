//! Port traits for the engine's collaborators.
//!
//! These are the only abstractions the engine depends on:
//! - Character store (read enabled profiles, record interventions)
//! - Generation (the text model behind every remark)
//! - Clock/Random (for deterministic tests)

use super::types::{CharacterTriggerProfile, TriggerAnalysis};
use crate::error::{GenerationError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Character store ────────────────────────────────────

#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Profiles with interventions enabled, in a stable order.
    async fn enabled_characters(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Result<Vec<CharacterTriggerProfile>, StoreError>;

    /// Set `last_intervention_at` and increment `total_interventions`, atomically.
    async fn record_intervention(
        &self,
        character_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// ── Generation ─────────────────────────────────────────

/// Everything the model gets to see for one character.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub story_id: String,
    pub character: CharacterTriggerProfile,
    pub current_text: String,
    pub addition: String,
    /// `None` for manual and ambient paths, which skip trigger scoring.
    pub analysis: Option<TriggerAnalysis>,
}

/// Raw model output before the engine wraps it into an `InterventionResult`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRemark {
    pub message: String,
    pub emotion: String,
    pub intensity: u8,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a remark for a character that already qualified.
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedRemark, GenerationError>;

    /// Let the model decide whether to speak at all. `Ok(None)` means it declined.
    async fn decide_ambient(
        &self,
        request: GenerationRequest,
    ) -> Result<Option<GeneratedRemark>, GenerationError>;

    /// Provider identifier for logs.
    fn id(&self) -> &str {
        "generator"
    }
}

// ── Testability ports ──────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn sample(&self) -> f64;
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// System clock - uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }

    fn pick(&self, len: usize) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len)
    }
}
