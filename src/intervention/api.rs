//! Caller-facing request/response shapes, as exposed by a thin HTTP layer.
//!
//! Auth and request validation happen before these are reached. Anything the
//! store cannot answer collapses into "no intervention".

use super::orchestrator::{EvaluationOutcome, InterventionEngine};
use super::types::{CharacterTriggerProfile, InterventionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterventionRequest {
    pub story_id: String,
    pub current_text: String,
    #[serde(default)]
    pub recent_addition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualTriggerRequest {
    pub story_id: String,
    #[serde(default)]
    pub character_id: Option<String>,
    #[serde(default)]
    pub current_text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterventionResponse {
    pub should_intervene: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention: Option<InterventionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl InterventionResponse {
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<EvaluationOutcome> for InterventionResponse {
    fn from(outcome: EvaluationOutcome) -> Self {
        Self {
            should_intervene: outcome.intervention.is_some(),
            intervention: outcome.intervention,
            cooldown_until: outcome.cooldown_until,
        }
    }
}

impl InterventionEngine {
    /// Enabled characters for a story, or an empty list if the store fails.
    pub async fn load_characters(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Vec<CharacterTriggerProfile> {
        match self.store.enabled_characters(story_id, user_id).await {
            Ok(characters) => characters,
            Err(e) => {
                tracing::warn!(
                    story = story_id,
                    error = %e,
                    "[Engine] Could not load characters"
                );
                Vec::new()
            }
        }
    }

    /// Explicit check for an authenticated caller.
    pub async fn handle_request(
        &self,
        user_id: &str,
        request: &InterventionRequest,
    ) -> InterventionResponse {
        let characters = self.load_characters(&request.story_id, user_id).await;
        if characters.is_empty() {
            return InterventionResponse::none();
        }
        self.evaluate_addition(
            &request.story_id,
            &characters,
            &request.current_text,
            request.recent_addition.trim(),
        )
        .await
        .into()
    }

    /// Manual trigger for an authenticated caller.
    pub async fn handle_manual(
        &self,
        user_id: &str,
        request: &ManualTriggerRequest,
    ) -> InterventionResponse {
        let characters = self.load_characters(&request.story_id, user_id).await;
        self.trigger_manual(
            &request.story_id,
            &characters,
            request.character_id.as_deref(),
            &request.current_text,
        )
        .await
        .into()
    }

    /// Ambient check for an authenticated caller.
    pub async fn handle_ambient(
        &self,
        user_id: &str,
        request: &InterventionRequest,
    ) -> InterventionResponse {
        let characters = self.load_characters(&request.story_id, user_id).await;
        self.evaluate_ambient(
            &request.story_id,
            &characters,
            &request.current_text,
            request.recent_addition.trim(),
        )
        .await
        .into()
    }
}
