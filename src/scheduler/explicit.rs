//! Explicit-trigger scheduler — debounced evaluation on every text change.
//!
//! Each change re-arms a short timer; only an uninterrupted pause fires a
//! cycle. While a cycle is running, further pauses just re-arm the timer.
//! A cycle needs at least `min_word_delta` newly written words; a shrunken
//! draft becomes the new baseline without being evaluated.

use super::backend::{EvaluationBackend, EvaluationMode, SchedulerEvent};
use super::state::{SchedulerState, TextSnapshot};
use super::stats::SchedulerStats;
use crate::config::ExplicitConfig;
use crate::intervention::delta::{extract_addition, word_count};
use crate::intervention::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Command {
    Change(String),
    Shutdown,
}

/// Handle to one session's debounced evaluation loop.
pub struct ExplicitScheduler {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
    in_flight: Arc<AtomicBool>,
    stats: Arc<SchedulerStats>,
}

impl ExplicitScheduler {
    /// Start the loop. `initial_text` becomes the first snapshot.
    pub fn spawn(
        backend: Arc<dyn EvaluationBackend>,
        config: ExplicitConfig,
        clock: Arc<dyn Clock>,
        initial_text: &str,
        events: mpsc::UnboundedSender<SchedulerEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(SchedulerStats::new());
        let state = SchedulerState::new(TextSnapshot::capture(initial_text, clock.now()));

        let worker = DebounceLoop {
            backend,
            config,
            clock,
            state,
            events,
            in_flight: in_flight.clone(),
            stats: stats.clone(),
        };
        let task = tokio::spawn(worker.run(rx));

        Self {
            tx,
            task,
            in_flight,
            stats,
        }
    }

    /// Report the editor's latest content.
    pub fn text_changed(&self, text: impl Into<String>) {
        let _ = self.tx.send(Command::Change(text.into()));
    }

    pub fn is_evaluating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.stats.clone()
    }

    /// Stop the loop. A cycle already running finishes on its own.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

struct DebounceLoop {
    backend: Arc<dyn EvaluationBackend>,
    config: ExplicitConfig,
    clock: Arc<dyn Clock>,
    state: SchedulerState,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    in_flight: Arc<AtomicBool>,
    stats: Arc<SchedulerStats>,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl DebounceLoop {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("[Scheduler] Explicit loop started");
        let mut latest: Option<String> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(Command::Change(text)) => {
                        if deadline.is_some() {
                            self.stats.record_coalesced();
                        }
                        latest = Some(text);
                        deadline = Some(Instant::now() + self.config.debounce());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = wait_until(deadline) => {
                    deadline = None;
                    if self.in_flight.load(Ordering::Acquire) {
                        self.stats.record_in_flight();
                        deadline = Some(Instant::now() + self.config.debounce());
                        continue;
                    }
                    if let Some(text) = latest.take() {
                        self.fire(text);
                    }
                }
            }
        }

        tracing::debug!("[Scheduler] Explicit loop stopped");
    }

    fn fire(&mut self, text: String) {
        let previous = self.state.snapshot();
        if text == previous.content {
            return;
        }
        let words = word_count(&text);
        let new_words = word_count(&extract_addition(&previous.content, &text));
        if new_words < self.config.min_word_delta {
            tracing::trace!(
                new_words,
                previous = previous.word_count,
                "[Scheduler] Not enough new words"
            );
            self.stats.record_gated_words();
            // After a deletion, measure later typing from the shorter text.
            if words < previous.word_count {
                self.state.commit(TextSnapshot {
                    content: text,
                    word_count: words,
                    captured_at: self.clock.now(),
                });
            }
            return;
        }

        let next = TextSnapshot {
            content: text.clone(),
            word_count: words,
            captured_at: self.clock.now(),
        };
        let previous = self.state.commit(next);

        self.in_flight.store(true, Ordering::Release);
        self.stats.record_cycle();

        let backend = self.backend.clone();
        let events = self.events.clone();
        let in_flight = self.in_flight.clone();
        let stats = self.stats.clone();
        tokio::spawn(async move {
            let response = backend.evaluate(&text, &previous.content).await;
            if let Some(intervention) = response.intervention {
                stats.record_intervention();
                let _ = events.send(SchedulerEvent {
                    mode: EvaluationMode::Explicit,
                    intervention,
                });
            }
            in_flight.store(false, Ordering::Release);
        });
    }
}
