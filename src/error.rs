//! Error types for the engine's collaborator boundaries.
//!
//! None of these ever reach the writer: the orchestrator contains them per
//! character and degrades to "no intervention".

use std::time::Duration;

/// Failure of the external text-generation collaborator.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GenerationError {
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Generation request failed: {0}")]
    Request(String),
    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),
}

/// Failure of the character store collaborator.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Failure while persisting or validating engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config serialization error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}
