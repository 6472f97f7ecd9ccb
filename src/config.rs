//! Engine configuration plus the shared helpers for loading/saving JSON
//! config files.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {} (using defaults)",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::info!(
                "[{}] No config file at {} (using defaults)",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(
    path: &Path,
    config: &T,
    label: &str,
) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    tracing::info!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

// ── Engine config ──────────────────────────────────────

/// Top-level engine configuration, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub orchestrator: OrchestratorConfig,
    pub explicit: ExplicitConfig,
    pub ambient: AmbientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound for one generation call. Exceeding it counts as a failure.
    pub generation_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: 15_000,
        }
    }
}

impl OrchestratorConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }
}

/// Explicit-trigger mode (debounced).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplicitConfig {
    /// Quiet period after the last keystroke before an evaluation fires.
    pub debounce_ms: u64,
    /// Words that must have been added since the last snapshot.
    pub min_word_delta: usize,
}

impl Default for ExplicitConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3_000,
            min_word_delta: 3,
        }
    }
}

impl ExplicitConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Ambient (probabilistic) mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmbientConfig {
    pub min_word_delta: usize,
    pub min_elapsed_secs: u64,
    /// Chance (0.0–1.0) that an eligible check actually asks the model.
    pub probability: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            min_word_delta: 50,
            min_elapsed_secs: 60,
            probability: 0.4,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Self {
        load_json_config(path, "Config")
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        save_json_config(path, self, "Config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ambient.probability) {
            return Err(ConfigError::Invalid(format!(
                "ambient.probability must be within [0, 1], got {}",
                self.ambient.probability
            )));
        }
        if self.orchestrator.generation_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.generation_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
