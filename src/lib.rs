pub mod config;
pub mod error;
pub mod intervention;
pub mod scheduler;

pub use config::EngineConfig;
pub use error::{ConfigError, GenerationError, StoreError};
pub use intervention::{
    InterventionEngine, InterventionRequest, InterventionResponse, InterventionResult,
    ManualTriggerRequest,
};
pub use scheduler::{AmbientScheduler, EngineBackend, ExplicitScheduler, SchedulerEvent};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Install the global fmt subscriber. Levels come from `MUSE_LOG`
/// (e.g. `MUSE_LOG=muse_engine=debug`), defaulting to `info`.
///
/// Safe to call more than once; an already installed subscriber wins.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_env("MUSE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
