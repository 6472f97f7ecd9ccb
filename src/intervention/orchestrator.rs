//! Intervention Orchestrator — walks the enabled characters in order and lets
//! the first one that qualifies speak.
//!
//! The loop is strictly sequential: at most one generation call is
//! outstanding per cycle, and "first qualifying character wins" stays a
//! deterministic rule. Every failure is contained to the character that
//! caused it; the writer only ever sees "someone spoke" or "nobody did".

use super::cooldown::{self, CharacterSlot, CooldownLedger};
use super::delta::extract_addition;
use super::ports::{
    CharacterStore, Clock, GeneratedRemark, GenerationRequest, Generator, RandomSource,
    SystemClock, SystemRandom,
};
use super::triggers;
use super::types::{CharacterState, CharacterTriggerProfile, InterventionResult};
use crate::config::OrchestratorConfig;
use crate::error::GenerationError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub const MAX_SUGGESTED_ACTIONS: usize = 2;
pub const MANUAL_REASON: &str = "Manual trigger";
pub const AMBIENT_REASON: &str = "Ambient observation";

/// What one evaluation cycle produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationOutcome {
    pub intervention: Option<InterventionResult>,
    /// Earliest cooldown end among characters skipped for cooldown.
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl EvaluationOutcome {
    fn spoke(result: InterventionResult) -> Self {
        Self {
            intervention: Some(result),
            cooldown_until: None,
        }
    }

    fn silent(cooldown_until: Option<DateTime<Utc>>) -> Self {
        Self {
            intervention: None,
            cooldown_until,
        }
    }
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

/// Owns the only mutable shared state of the system: per-character
/// cooldowns and intervention counters.
pub struct InterventionEngine {
    pub(crate) store: Arc<dyn CharacterStore>,
    generator: Arc<dyn Generator>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    ledger: CooldownLedger,
    config: OrchestratorConfig,
}

impl InterventionEngine {
    pub fn new(store: Arc<dyn CharacterStore>, generator: Arc<dyn Generator>) -> Self {
        Self {
            store,
            generator,
            clock: Arc::new(SystemClock),
            random: Arc::new(SystemRandom),
            ledger: CooldownLedger::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Lifecycle state of one character as this engine sees it.
    pub async fn character_state(&self, profile: &CharacterTriggerProfile) -> CharacterState {
        let Some(slot) = self.ledger.try_lock(&profile.id) else {
            return cooldown::character_state(profile, self.now(), true);
        };
        let mut view = profile.clone();
        view.last_intervention_at = slot.effective_last(profile);
        cooldown::character_state(&view, self.now(), false)
    }

    // ── Explicit path ──────────────────────────────────

    /// Compute the addition between two snapshots, then run one cycle.
    pub async fn evaluate(
        &self,
        story_id: &str,
        characters: &[CharacterTriggerProfile],
        current_text: &str,
        previous_text: &str,
    ) -> EvaluationOutcome {
        let addition = extract_addition(previous_text, current_text);
        self.evaluate_addition(story_id, characters, current_text, &addition)
            .await
    }

    /// Run one cycle against an already known addition.
    pub async fn evaluate_addition(
        &self,
        story_id: &str,
        characters: &[CharacterTriggerProfile],
        current_text: &str,
        addition: &str,
    ) -> EvaluationOutcome {
        let span = tracing::info_span!("evaluation", cycle = %Uuid::new_v4(), story = story_id);
        self.run_cycle(story_id, characters, current_text, addition)
            .instrument(span)
            .await
    }

    async fn run_cycle(
        &self,
        story_id: &str,
        characters: &[CharacterTriggerProfile],
        current_text: &str,
        addition: &str,
    ) -> EvaluationOutcome {
        if addition.trim().is_empty() {
            tracing::debug!("[Orchestrator] Empty addition, nothing to evaluate");
            return EvaluationOutcome::default();
        }

        let pruned = self.ledger.prune(self.now());
        if pruned > 0 {
            tracing::debug!(pruned, "[Orchestrator] Released idle cooldown slots");
        }

        let mut cooldown_until = None;

        for character in characters.iter().filter(|c| c.intervention_enabled) {
            let mut slot = self.ledger.lock(&character.id).await;

            let eligibility = cooldown::check_with_last(
                character,
                slot.effective_last(character),
                self.now(),
            );
            if !eligibility.eligible {
                tracing::debug!(
                    character = %character.name,
                    until = ?eligibility.cooldown_ends_at,
                    "[Orchestrator] Character in cooldown"
                );
                cooldown_until = earliest(cooldown_until, eligibility.cooldown_ends_at);
                continue;
            }

            let analysis = triggers::analyze(character, addition);
            if !analysis.should_intervene {
                tracing::trace!(
                    character = %character.name,
                    score = analysis.relevance_score,
                    "[Orchestrator] Below threshold"
                );
                continue;
            }

            let reason = analysis.reason.clone();
            let request = GenerationRequest {
                story_id: story_id.to_string(),
                character: character.clone(),
                current_text: current_text.to_string(),
                addition: addition.to_string(),
                analysis: Some(analysis),
            };

            match self.generate_bounded(request).await {
                Ok(remark) => {
                    let result = self.commit(&mut slot, character, remark, reason).await;
                    return EvaluationOutcome::spoke(result);
                }
                Err(e) => {
                    tracing::warn!(
                        character = %character.name,
                        error = %e,
                        "[Orchestrator] Generation failed, trying next character"
                    );
                }
            }
        }

        EvaluationOutcome::silent(cooldown_until)
    }

    // ── Manual path ────────────────────────────────────

    /// Force a remark from one character (or a random enabled one),
    /// skipping cooldown and trigger scoring.
    pub async fn trigger_manual(
        &self,
        story_id: &str,
        characters: &[CharacterTriggerProfile],
        character_id: Option<&str>,
        current_text: &str,
    ) -> EvaluationOutcome {
        let enabled: Vec<&CharacterTriggerProfile> =
            characters.iter().filter(|c| c.intervention_enabled).collect();

        let chosen = match character_id {
            Some(id) => enabled.iter().copied().find(|c| c.id == id),
            None if enabled.is_empty() => None,
            None => Some(enabled[self.random.pick(enabled.len())]),
        };

        let Some(character) = chosen else {
            tracing::info!(
                story = story_id,
                requested = ?character_id,
                "[Orchestrator] Manual trigger found no enabled character"
            );
            return EvaluationOutcome::default();
        };

        let mut slot = self.ledger.lock(&character.id).await;
        let request = GenerationRequest {
            story_id: story_id.to_string(),
            character: character.clone(),
            current_text: current_text.to_string(),
            addition: String::new(),
            analysis: None,
        };

        match self.generate_bounded(request).await {
            Ok(remark) => {
                let result = self
                    .commit(&mut slot, character, remark, MANUAL_REASON.to_string())
                    .await;
                EvaluationOutcome::spoke(result)
            }
            Err(e) => {
                tracing::warn!(
                    character = %character.name,
                    error = %e,
                    "[Orchestrator] Manual generation failed"
                );
                EvaluationOutcome::default()
            }
        }
    }

    // ── Ambient path ───────────────────────────────────

    /// Ask one randomly chosen, currently eligible character whether it
    /// wants to say something. The model may decline.
    pub async fn evaluate_ambient(
        &self,
        story_id: &str,
        characters: &[CharacterTriggerProfile],
        current_text: &str,
        addition: &str,
    ) -> EvaluationOutcome {
        let now = self.now();
        let mut candidates = Vec::new();
        let mut cooldown_until = None;

        for character in characters.iter().filter(|c| c.intervention_enabled) {
            let slot = self.ledger.lock(&character.id).await;
            let eligibility =
                cooldown::check_with_last(character, slot.effective_last(character), now);
            if eligibility.eligible {
                candidates.push(character);
            } else {
                cooldown_until = earliest(cooldown_until, eligibility.cooldown_ends_at);
            }
        }

        if candidates.is_empty() {
            tracing::debug!(story = story_id, "[Orchestrator] No ambient candidates");
            return EvaluationOutcome::silent(cooldown_until);
        }

        let character = candidates[self.random.pick(candidates.len())];
        let mut slot = self.ledger.lock(&character.id).await;

        // Another cycle may have fired this character while we were choosing.
        let recheck =
            cooldown::check_with_last(character, slot.effective_last(character), self.now());
        if !recheck.eligible {
            return EvaluationOutcome::silent(recheck.cooldown_ends_at);
        }

        let request = GenerationRequest {
            story_id: story_id.to_string(),
            character: character.clone(),
            current_text: current_text.to_string(),
            addition: addition.to_string(),
            analysis: None,
        };

        let timeout = self.config.generation_timeout();
        let decision = match tokio::time::timeout(timeout, self.generator.decide_ambient(request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        };

        match decision {
            Ok(Some(remark)) if !remark.message.trim().is_empty() => {
                let result = self
                    .commit(&mut slot, character, remark, AMBIENT_REASON.to_string())
                    .await;
                EvaluationOutcome::spoke(result)
            }
            Ok(_) => {
                tracing::debug!(character = %character.name, "[Orchestrator] Model declined ambient remark");
                EvaluationOutcome::default()
            }
            Err(e) => {
                tracing::warn!(
                    character = %character.name,
                    error = %e,
                    "[Orchestrator] Ambient decision failed"
                );
                EvaluationOutcome::default()
            }
        }
    }

    // ── Shared helpers ─────────────────────────────────

    async fn generate_bounded(
        &self,
        request: GenerationRequest,
    ) -> Result<GeneratedRemark, GenerationError> {
        let timeout = self.config.generation_timeout();
        let remark = tokio::time::timeout(timeout, self.generator.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout(timeout))??;

        if remark.message.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(format!(
                "{} returned an empty message",
                self.generator.id()
            )));
        }
        Ok(remark)
    }

    /// Record a successful intervention and build the result.
    async fn commit(
        &self,
        slot: &mut CharacterSlot,
        character: &CharacterTriggerProfile,
        remark: GeneratedRemark,
        reason: String,
    ) -> InterventionResult {
        let now = self.now();
        slot.record(now);

        if let Err(e) = self.store.record_intervention(&character.id, now).await {
            tracing::error!(
                character = %character.name,
                error = %e,
                "[Orchestrator] Failed to persist intervention; cooldown held in memory"
            );
        }

        tracing::info!(
            character = %character.name,
            reason = %reason,
            "[Orchestrator] Character intervened"
        );

        build_result(character, remark, reason)
    }
}

fn build_result(
    character: &CharacterTriggerProfile,
    remark: GeneratedRemark,
    reason: String,
) -> InterventionResult {
    let mut actions = remark.suggested_actions;
    actions.truncate(MAX_SUGGESTED_ACTIONS);

    InterventionResult {
        character_id: character.id.clone(),
        character_name: character.name.clone(),
        message: remark.message.trim().to_string(),
        emotion: remark.emotion,
        style: character.intervention_style,
        intensity: remark.intensity.clamp(1, 10),
        trigger_reason: reason,
        suggested_actions: (!actions.is_empty()).then_some(actions),
    }
}
