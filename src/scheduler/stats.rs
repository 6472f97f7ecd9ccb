//! Lightweight counters for one session's scheduler.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SchedulerStats {
    cycles_started: AtomicU64,
    cycles_coalesced: AtomicU64,
    skipped_in_flight: AtomicU64,
    gated_words: AtomicU64,
    gated_time: AtomicU64,
    sampled_out: AtomicU64,
    interventions: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cycles_started: u64,
    pub cycles_coalesced: u64,
    pub skipped_in_flight: u64,
    pub gated_words: u64,
    pub gated_time: u64,
    pub sampled_out: u64,
    pub interventions: u64,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.cycles_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_in_flight(&self) {
        self.skipped_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gated_words(&self) {
        self.gated_words.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gated_time(&self) {
        self.gated_time.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sampled_out(&self) {
        self.sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_intervention(&self) {
        self.interventions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_coalesced: self.cycles_coalesced.load(Ordering::Relaxed),
            skipped_in_flight: self.skipped_in_flight.load(Ordering::Relaxed),
            gated_words: self.gated_words.load(Ordering::Relaxed),
            gated_time: self.gated_time.load(Ordering::Relaxed),
            sampled_out: self.sampled_out.load(Ordering::Relaxed),
            interventions: self.interventions.load(Ordering::Relaxed),
        }
    }
}
