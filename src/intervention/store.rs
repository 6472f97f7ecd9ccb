//! In-memory character store — reference `CharacterStore` for hosts that
//! keep profiles in process, and for tests.

use super::ports::CharacterStore;
use super::types::CharacterTriggerProfile;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredProfile {
    story_id: String,
    user_id: String,
    profile: CharacterTriggerProfile,
}

/// Profiles kept in insertion order, which is the order evaluation uses.
#[derive(Debug, Default)]
pub struct InMemoryCharacterStore {
    records: RwLock<Vec<StoredProfile>>,
}

impl InMemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile owned by `user_id` in `story_id`.
    pub async fn upsert(&self, story_id: &str, user_id: &str, profile: CharacterTriggerProfile) {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.profile.id == profile.id) {
            Some(existing) => {
                existing.story_id = story_id.to_string();
                existing.user_id = user_id.to_string();
                existing.profile = profile;
            }
            None => records.push(StoredProfile {
                story_id: story_id.to_string(),
                user_id: user_id.to_string(),
                profile,
            }),
        }
    }

    pub async fn profile(&self, character_id: &str) -> Option<CharacterTriggerProfile> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.profile.id == character_id)
            .map(|r| r.profile.clone())
    }

    /// Flip `intervention_enabled` for one character.
    pub async fn set_enabled(&self, character_id: &str, enabled: bool) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.profile.id == character_id)
            .ok_or_else(|| StoreError::NotFound(character_id.to_string()))?;
        record.profile.intervention_enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl CharacterStore for InMemoryCharacterStore {
    async fn enabled_characters(
        &self,
        story_id: &str,
        user_id: &str,
    ) -> Result<Vec<CharacterTriggerProfile>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.story_id == story_id && r.user_id == user_id)
            .filter(|r| r.profile.intervention_enabled)
            .map(|r| r.profile.clone())
            .collect())
    }

    async fn record_intervention(
        &self,
        character_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.profile.id == character_id)
            .ok_or_else(|| StoreError::NotFound(character_id.to_string()))?;
        record.profile.record_intervention(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn enabled_characters_filter_and_keep_order() {
        let store = InMemoryCharacterStore::new();
        store.upsert("s1", "u1", CharacterTriggerProfile::new("b", "Bruno")).await;
        store.upsert("s1", "u1", CharacterTriggerProfile::new("a", "Ana")).await;
        store
            .upsert("s1", "u1", CharacterTriggerProfile::new("c", "Carla").disabled())
            .await;
        store.upsert("s2", "u1", CharacterTriggerProfile::new("d", "Dora")).await;
        store.upsert("s1", "u2", CharacterTriggerProfile::new("e", "Eva")).await;

        let ids: Vec<String> = store
            .enabled_characters("s1", "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn record_intervention_updates_counters() {
        let store = InMemoryCharacterStore::new();
        store.upsert("s1", "u1", CharacterTriggerProfile::new("a", "Ana")).await;
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        store.record_intervention("a", at).await.unwrap();
        let profile = store.profile("a").await.unwrap();
        assert_eq!(profile.last_intervention_at, Some(at));
        assert_eq!(profile.total_interventions, 1);
    }

    #[tokio::test]
    async fn unknown_character_is_not_found() {
        let store = InMemoryCharacterStore::new();
        let err = store.record_intervention("ghost", Utc::now()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("ghost".to_string()));
        assert!(store.set_enabled("ghost", false).await.is_err());
    }

    #[tokio::test]
    async fn disabling_removes_from_enabled_list() {
        let store = InMemoryCharacterStore::new();
        store.upsert("s1", "u1", CharacterTriggerProfile::new("a", "Ana")).await;
        store.set_enabled("a", false).await.unwrap();
        assert!(store.enabled_characters("s1", "u1").await.unwrap().is_empty());
    }
}
