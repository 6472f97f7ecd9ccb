//! What a scheduler calls once it decides an evaluation should happen.

use crate::intervention::{InterventionEngine, InterventionResponse, InterventionResult};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    Explicit,
    Ambient,
    Manual,
}

/// Emitted whenever a scheduled cycle produced a remark.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchedulerEvent {
    pub mode: EvaluationMode,
    pub intervention: InterventionResult,
}

#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    async fn evaluate(&self, current_text: &str, previous_text: &str) -> InterventionResponse;

    async fn ambient(&self, current_text: &str, recent_addition: &str) -> InterventionResponse;

    async fn manual(&self, character_id: Option<&str>, current_text: &str) -> InterventionResponse;
}

/// Backend bound to one story and user, calling the engine in process.
pub struct EngineBackend {
    engine: Arc<InterventionEngine>,
    story_id: String,
    user_id: String,
}

impl EngineBackend {
    pub fn new(
        engine: Arc<InterventionEngine>,
        story_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            story_id: story_id.into(),
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl EvaluationBackend for EngineBackend {
    async fn evaluate(&self, current_text: &str, previous_text: &str) -> InterventionResponse {
        let characters = self.engine.load_characters(&self.story_id, &self.user_id).await;
        if characters.is_empty() {
            return InterventionResponse::none();
        }
        self.engine
            .evaluate(&self.story_id, &characters, current_text, previous_text)
            .await
            .into()
    }

    async fn ambient(&self, current_text: &str, recent_addition: &str) -> InterventionResponse {
        let characters = self.engine.load_characters(&self.story_id, &self.user_id).await;
        self.engine
            .evaluate_ambient(&self.story_id, &characters, current_text, recent_addition)
            .await
            .into()
    }

    async fn manual(&self, character_id: Option<&str>, current_text: &str) -> InterventionResponse {
        let characters = self.engine.load_characters(&self.story_id, &self.user_id).await;
        self.engine
            .trigger_manual(&self.story_id, &characters, character_id, current_text)
            .await
            .into()
    }
}
