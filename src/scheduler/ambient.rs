//! Ambient scheduler — occasional unprompted remarks, independent of
//! keyword triggers.
//!
//! A check only happens once enough words AND enough time have passed since
//! the previous one. Each check then rolls once against a fixed probability;
//! the counters reset whether or not the roll lets the call through.

use super::backend::{EvaluationBackend, EvaluationMode, SchedulerEvent};
use super::state::AmbientState;
use super::stats::SchedulerStats;
use crate::config::AmbientConfig;
use crate::intervention::delta::{extract_addition, word_count};
use crate::intervention::{Clock, InterventionResult, RandomSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Why a text change did or did not lead to an ambient call.
#[derive(Debug, Clone, PartialEq)]
pub enum AmbientGate {
    InFlight,
    NotEnoughWords { delta: usize },
    NotEnoughTime { elapsed_secs: i64 },
    SampledOut { roll: f64 },
    Proceed { addition: String },
}

pub struct AmbientScheduler {
    backend: Arc<dyn EvaluationBackend>,
    config: AmbientConfig,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    state: Mutex<AmbientState>,
    in_flight: AtomicBool,
    events: Option<tokio::sync::mpsc::UnboundedSender<SchedulerEvent>>,
    stats: Arc<SchedulerStats>,
}

/// Clears the in-flight flag however the call ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AmbientScheduler {
    pub fn new(
        backend: Arc<dyn EvaluationBackend>,
        config: AmbientConfig,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        initial_text: &str,
    ) -> Self {
        let state = AmbientState::new(initial_text, clock.now());
        Self {
            backend,
            config,
            clock,
            random,
            state: Mutex::new(state),
            in_flight: AtomicBool::new(false),
            events: None,
            stats: Arc::new(SchedulerStats::new()),
        }
    }

    /// Also publish produced remarks on an event channel.
    pub fn with_events(mut self, events: tokio::sync::mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.stats.clone()
    }

    pub fn state(&self) -> AmbientState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AmbientState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run the word/time/probability gates for the current text.
    pub fn gate(&self, text: &str) -> AmbientGate {
        if self.in_flight.load(Ordering::Acquire) {
            self.stats.record_in_flight();
            return AmbientGate::InFlight;
        }

        let now = self.clock.now();
        let words = word_count(text);
        let mut state = self.lock_state();

        let delta = words.saturating_sub(state.last_checked_word_count);
        if delta < self.config.min_word_delta {
            self.stats.record_gated_words();
            return AmbientGate::NotEnoughWords { delta };
        }

        let elapsed_secs = (now - state.last_checked_at).num_seconds();
        if elapsed_secs < self.config.min_elapsed_secs as i64 {
            self.stats.record_gated_time();
            return AmbientGate::NotEnoughTime { elapsed_secs };
        }

        let addition = extract_addition(&state.last_checked_text, text);
        state.reset(text, words, now);

        let roll = self.random.sample();
        if roll >= self.config.probability {
            self.stats.record_sampled_out();
            tracing::debug!(roll, "[Ambient] Sampled out");
            return AmbientGate::SampledOut { roll };
        }

        AmbientGate::Proceed { addition }
    }

    /// Feed a text change. Returns a remark if one was produced.
    pub async fn observe(&self, text: &str) -> Option<InterventionResult> {
        let AmbientGate::Proceed { addition } = self.gate(text) else {
            return None;
        };
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.stats.record_in_flight();
            return None;
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.stats.record_cycle();
        tracing::debug!("[Ambient] Asking model whether to intervene");
        let response = self.backend.ambient(text, &addition).await;
        self.publish(EvaluationMode::Ambient, response.intervention)
    }

    /// Bypass every gate; still only active characters can be chosen.
    pub async fn force(
        &self,
        character_id: Option<&str>,
        text: &str,
    ) -> Option<InterventionResult> {
        {
            let mut state = self.lock_state();
            state.reset(text, word_count(text), self.clock.now());
        }
        self.stats.record_cycle();
        let response = self.backend.manual(character_id, text).await;
        self.publish(EvaluationMode::Manual, response.intervention)
    }

    fn publish(
        &self,
        mode: EvaluationMode,
        intervention: Option<InterventionResult>,
    ) -> Option<InterventionResult> {
        let intervention = intervention?;
        self.stats.record_intervention();
        if let Some(events) = &self.events {
            let _ = events.send(SchedulerEvent {
                mode,
                intervention: intervention.clone(),
            });
        }
        Some(intervention)
    }
}
