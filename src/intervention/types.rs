//! Shared data model: character trigger profiles, triggers, analyses and
//! the intervention result surfaced to the writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Policy enums ───────────────────────────────────────

/// How a character phrases its remark. Passed straight through to generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterventionStyle {
    #[default]
    Suggestion,
    Complaint,
    Question,
    Encouragement,
}

/// The single knob that drives both the relevance threshold and the cooldown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterventionFrequency {
    Low,
    #[default]
    Medium,
    High,
}

/// Threshold and cooldown that one frequency setting resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyPolicy {
    pub threshold: f32,
    pub cooldown: Duration,
}

impl InterventionFrequency {
    /// The one lookup table: both values always move together.
    pub const fn policy(self) -> FrequencyPolicy {
        match self {
            InterventionFrequency::Low => FrequencyPolicy {
                threshold: 0.8,
                cooldown: Duration::from_secs(5 * 60),
            },
            InterventionFrequency::Medium => FrequencyPolicy {
                threshold: 0.5,
                cooldown: Duration::from_secs(2 * 60),
            },
            InterventionFrequency::High => FrequencyPolicy {
                threshold: 0.3,
                cooldown: Duration::from_secs(30),
            },
        }
    }

    pub const fn threshold(self) -> f32 {
        self.policy().threshold
    }

    pub const fn cooldown(self) -> Duration {
        self.policy().cooldown
    }
}

// ── Profile ────────────────────────────────────────────

/// One character's trigger configuration within a story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterTriggerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub trigger_words: Vec<String>,
    #[serde(default)]
    pub trigger_topics: Vec<String>,
    #[serde(default = "default_enabled")]
    pub intervention_enabled: bool,
    #[serde(default)]
    pub intervention_style: InterventionStyle,
    #[serde(default)]
    pub intervention_frequency: InterventionFrequency,
    #[serde(default)]
    pub last_intervention_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_interventions: u64,
}

fn default_enabled() -> bool {
    true
}

impl CharacterTriggerProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger_words: Vec::new(),
            trigger_topics: Vec::new(),
            intervention_enabled: true,
            intervention_style: InterventionStyle::default(),
            intervention_frequency: InterventionFrequency::default(),
            last_intervention_at: None,
            total_interventions: 0,
        }
    }

    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_frequency(mut self, frequency: InterventionFrequency) -> Self {
        self.intervention_frequency = frequency;
        self
    }

    pub fn with_style(mut self, style: InterventionStyle) -> Self {
        self.intervention_style = style;
        self
    }

    pub fn with_last_intervention(mut self, at: DateTime<Utc>) -> Self {
        self.last_intervention_at = Some(at);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.intervention_enabled = false;
        self
    }

    /// Apply one successful intervention. The timestamp never moves backwards.
    pub fn record_intervention(&mut self, at: DateTime<Utc>) {
        self.last_intervention_at = Some(match self.last_intervention_at {
            Some(prev) if prev > at => prev,
            _ => at,
        });
        self.total_interventions += 1;
    }
}

// ── Triggers & analysis ────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Word,
    CharacterMention,
    Topic,
}

impl TriggerKind {
    pub const fn confidence(self) -> f32 {
        match self {
            TriggerKind::Word => 0.9,
            TriggerKind::CharacterMention => 1.0,
            TriggerKind::Topic => 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    #[serde(rename = "match")]
    pub matched: String,
    pub confidence: f32,
}

impl Trigger {
    pub fn new(kind: TriggerKind, matched: impl Into<String>) -> Self {
        Self {
            kind,
            matched: matched.into(),
            confidence: kind.confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAnalysis {
    pub triggers: Vec<Trigger>,
    pub relevance_score: f32,
    pub should_intervene: bool,
    pub reason: String,
}

// ── Result ─────────────────────────────────────────────

/// A remark ready to show to the writer. Message text only ever comes from
/// the generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterventionResult {
    pub character_id: String,
    pub character_name: String,
    pub message: String,
    pub emotion: String,
    #[serde(rename = "type")]
    pub style: InterventionStyle,
    pub intensity: u8,
    pub trigger_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<Vec<String>>,
}

/// Derived per-character lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CharacterState {
    Disabled,
    Idle,
    Generating,
    CooldownActive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn frequency_table_couples_threshold_and_cooldown() {
        assert_eq!(InterventionFrequency::Low.threshold(), 0.8);
        assert_eq!(InterventionFrequency::Medium.threshold(), 0.5);
        assert_eq!(InterventionFrequency::High.threshold(), 0.3);
        assert_eq!(InterventionFrequency::Low.cooldown(), Duration::from_secs(300));
        assert_eq!(InterventionFrequency::Medium.cooldown(), Duration::from_secs(120));
        assert_eq!(InterventionFrequency::High.cooldown(), Duration::from_secs(30));
    }

    #[test]
    fn record_intervention_never_moves_backwards() {
        let later = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();

        let mut profile = CharacterTriggerProfile::new("c1", "Elena");
        profile.record_intervention(later);
        profile.record_intervention(earlier);

        assert_eq!(profile.last_intervention_at, Some(later));
        assert_eq!(profile.total_interventions, 2);
    }

    #[test]
    fn profile_deserializes_from_camel_case() {
        let json = r#"{
            "id": "c1",
            "name": "Elena",
            "triggerWords": ["secreto"],
            "interventionFrequency": "high",
            "interventionStyle": "question"
        }"#;
        let profile: CharacterTriggerProfile = serde_json::from_str(json).unwrap();
        assert!(profile.intervention_enabled);
        assert_eq!(profile.intervention_frequency, InterventionFrequency::High);
        assert_eq!(profile.intervention_style, InterventionStyle::Question);
        assert_eq!(profile.total_interventions, 0);
    }

    #[test]
    fn trigger_serializes_with_wire_names() {
        let json = serde_json::to_value(Trigger::new(TriggerKind::CharacterMention, "Elena")).unwrap();
        assert_eq!(json["type"], "character_mention");
        assert_eq!(json["match"], "Elena");
        assert_eq!(json["confidence"], 1.0);
    }
}
