//! Intervention engine: delta extraction, trigger analysis, cooldowns and the
//! first-qualifying-wins orchestrator.

pub mod api;
pub mod cooldown;
pub mod delta;
pub mod orchestrator;
pub mod ports;
pub mod store;
pub mod triggers;
pub mod types;

pub use api::{InterventionRequest, InterventionResponse, ManualTriggerRequest};
pub use orchestrator::{EvaluationOutcome, InterventionEngine};
pub use ports::{CharacterStore, Clock, GeneratedRemark, GenerationRequest, Generator, RandomSource};
pub use store::InMemoryCharacterStore;
pub use types::*;

#[cfg(test)]
pub(crate) mod tests;
