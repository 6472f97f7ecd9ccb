//! Evaluation schedulers: decide *when* the engine is asked at all.
//!
//! Two independent strategies, each owning its own per-session state:
//! - `ExplicitScheduler` debounces typing and evaluates keyword triggers.
//! - `AmbientScheduler` samples occasional trigger-free remarks.

pub mod ambient;
pub mod backend;
pub mod explicit;
pub mod state;
pub mod stats;

pub use ambient::{AmbientGate, AmbientScheduler};
pub use backend::{EngineBackend, EvaluationBackend, EvaluationMode, SchedulerEvent};
pub use explicit::ExplicitScheduler;
pub use state::{AmbientState, SchedulerState, TextSnapshot};
pub use stats::{SchedulerStats, StatsSnapshot};
