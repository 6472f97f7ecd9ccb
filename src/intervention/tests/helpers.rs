use crate::error::{GenerationError, StoreError};
use crate::intervention::ports::{
    CharacterStore, Clock, GeneratedRemark, GenerationRequest, Generator, RandomSource,
};
use crate::intervention::store::InMemoryCharacterStore;
use crate::intervention::types::CharacterTriggerProfile;
use crate::intervention::InterventionEngine;
use crate::config::OrchestratorConfig;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const STORY: &str = "story-1";
pub const USER: &str = "user-1";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

// ── Clock / Random ──────────────────────────────────────────

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Random source returning fixed values.
pub struct FixedRandom {
    pub sample: f64,
    pub index: usize,
}

impl RandomSource for FixedRandom {
    fn sample(&self) -> f64 {
        self.sample
    }

    fn pick(&self, len: usize) -> usize {
        self.index % len
    }
}

// ── Generator ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Behavior {
    Reply,
    Fail,
    Hang,
    Empty,
    Decline,
    Slow(Duration),
}

/// Generator scripted per character id; records every call in order.
pub struct ScriptedGenerator {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<Vec<String>>,
    pub actions: Vec<String>,
    pub intensity: u8,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            actions: Vec::new(),
            intensity: 5,
        }
    }

    pub fn with(self, character_id: &str, behavior: Behavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(character_id.to_string(), behavior);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn behavior(&self, character_id: &str) -> Behavior {
        self.behaviors
            .lock()
            .unwrap()
            .get(character_id)
            .cloned()
            .unwrap_or(Behavior::Reply)
    }

    fn remark(&self, request: &GenerationRequest) -> GeneratedRemark {
        GeneratedRemark {
            message: format!("{} has something to say", request.character.name),
            emotion: "curious".to_string(),
            intensity: self.intensity,
            suggested_actions: self.actions.clone(),
        }
    }

    async fn respond(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<GeneratedRemark>, GenerationError> {
        self.calls.lock().unwrap().push(request.character.id.clone());
        match self.behavior(&request.character.id) {
            Behavior::Reply => Ok(Some(self.remark(request))),
            Behavior::Fail => Err(GenerationError::Request("connection reset".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Some(self.remark(request)))
            }
            Behavior::Empty => Ok(Some(GeneratedRemark {
                message: "   ".to_string(),
                ..self.remark(request)
            })),
            Behavior::Decline => Ok(None),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Some(self.remark(request)))
            }
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedRemark, GenerationError> {
        self.respond(&request)
            .await?
            .ok_or_else(|| GenerationError::InvalidResponse("declined".to_string()))
    }

    async fn decide_ambient(
        &self,
        request: GenerationRequest,
    ) -> Result<Option<GeneratedRemark>, GenerationError> {
        self.respond(&request).await
    }

    fn id(&self) -> &str {
        "scripted"
    }
}

// ── Store ───────────────────────────────────────────────────

/// Store that fails every call.
pub struct BrokenStore;

#[async_trait]
impl CharacterStore for BrokenStore {
    async fn enabled_characters(
        &self,
        _story_id: &str,
        _user_id: &str,
    ) -> Result<Vec<CharacterTriggerProfile>, StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }

    async fn record_intervention(
        &self,
        _character_id: &str,
        _at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }
}

// ── Engine setup ────────────────────────────────────────────

pub struct Harness {
    pub engine: InterventionEngine,
    pub store: Arc<InMemoryCharacterStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub clock: Arc<ManualClock>,
}

/// Build an engine over an in-memory store seeded with `profiles` (in order).
pub async fn harness(
    profiles: Vec<CharacterTriggerProfile>,
    generator: ScriptedGenerator,
    random: FixedRandom,
) -> Harness {
    let store = Arc::new(InMemoryCharacterStore::new());
    for profile in profiles {
        store.upsert(STORY, USER, profile).await;
    }
    let generator = Arc::new(generator);
    let clock = Arc::new(ManualClock::new(t0()));

    let engine = InterventionEngine::new(store.clone(), generator.clone())
        .with_clock(clock.clone())
        .with_random(Arc::new(random))
        .with_config(OrchestratorConfig {
            generation_timeout_ms: 200,
        });

    Harness {
        engine,
        store,
        generator,
        clock,
    }
}

pub fn no_random() -> FixedRandom {
    FixedRandom {
        sample: 0.0,
        index: 0,
    }
}
