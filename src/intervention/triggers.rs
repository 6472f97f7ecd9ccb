//! Trigger Analyzer — keyword-based relevance scoring for one character.
//!
//! Pure substring matching over the lower-cased addition: trigger words,
//! the character's own name, and topic tags resolved through a static
//! keyword table. No I/O, no randomness.

use super::types::{CharacterTriggerProfile, Trigger, TriggerAnalysis, TriggerKind};

pub const NO_TRIGGERS_REASON: &str = "No triggers found";

// ── Topic keyword table ────────────────────────────────

const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "love",
        &["amor", "love", "corazón", "heart", "beso", "kiss", "romance", "enamorado"],
    ),
    (
        "danger",
        &["peligro", "danger", "amenaza", "threat", "miedo", "fear", "muerte", "death"],
    ),
    (
        "betrayal",
        &["traición", "betrayal", "traidor", "traitor", "mentira", "lie", "engaño", "deceive"],
    ),
    (
        "adventure",
        &["aventura", "adventure", "viaje", "journey", "explorar", "explore", "misión", "quest"],
    ),
    (
        "mystery",
        &["misterio", "mystery", "secreto", "secret", "enigma", "pista", "clue", "oculto"],
    ),
    (
        "conflict",
        &["conflicto", "conflict", "pelea", "fight", "batalla", "battle", "guerra", "war"],
    ),
];

/// Keywords for a topic tag. Unmapped tags match on the tag itself.
pub fn topic_keywords(tag: &str) -> Vec<String> {
    let tag_lower = tag.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(topic, _)| *topic == tag_lower)
        .map(|(_, kws)| kws.iter().map(|kw| kw.to_string()).collect())
        .unwrap_or_else(|| vec![tag_lower])
}

/// Analyze an addition against one profile.
pub fn analyze(profile: &CharacterTriggerProfile, addition: &str) -> TriggerAnalysis {
    let lower = addition.to_lowercase();
    let mut triggers = Vec::new();

    for word in &profile.trigger_words {
        let needle = word.trim().to_lowercase();
        if !needle.is_empty() && lower.contains(&needle) {
            triggers.push(Trigger::new(TriggerKind::Word, word.clone()));
        }
    }

    let name = profile.name.trim().to_lowercase();
    if !name.is_empty() && lower.contains(&name) {
        triggers.push(Trigger::new(TriggerKind::CharacterMention, profile.name.clone()));
    }

    for tag in &profile.trigger_topics {
        // First keyword hit is enough for a topic.
        if topic_keywords(tag).iter().any(|kw| !kw.is_empty() && lower.contains(kw.as_str())) {
            triggers.push(Trigger::new(TriggerKind::Topic, tag.clone()));
        }
    }

    let relevance_score = if triggers.is_empty() {
        0.0
    } else {
        triggers.iter().map(|t| t.confidence).sum::<f32>() / triggers.len() as f32
    };

    let threshold = profile.intervention_frequency.threshold();
    let should_intervene = !triggers.is_empty() && relevance_score >= threshold;

    let reason = if triggers.is_empty() {
        NO_TRIGGERS_REASON.to_string()
    } else {
        let matches: Vec<&str> = triggers.iter().map(|t| t.matched.as_str()).collect();
        format!("Triggered by: {}", matches.join(", "))
    };

    TriggerAnalysis {
        triggers,
        relevance_score,
        should_intervene,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervention::types::InterventionFrequency;
    use proptest::prelude::*;

    const ALL_FREQUENCIES: [InterventionFrequency; 3] = [
        InterventionFrequency::Low,
        InterventionFrequency::Medium,
        InterventionFrequency::High,
    ];

    fn elena() -> CharacterTriggerProfile {
        CharacterTriggerProfile::new("c-elena", "Elena")
            .with_words(["secreto"])
            .with_frequency(InterventionFrequency::Medium)
    }

    #[test]
    fn word_and_name_trigger_together() {
        let analysis = analyze(
            &elena(),
            "Elena entró en la habitación y descubrió un secreto.",
        );
        assert_eq!(
            analysis.triggers,
            vec![
                Trigger::new(TriggerKind::Word, "secreto"),
                Trigger::new(TriggerKind::CharacterMention, "Elena"),
            ]
        );
        assert!((analysis.relevance_score - 0.95).abs() < 1e-6);
        assert!(analysis.should_intervene);
        assert_eq!(analysis.reason, "Triggered by: secreto, Elena");
    }

    #[test]
    fn unrelated_text_never_intervenes() {
        for freq in ALL_FREQUENCIES {
            let profile = elena().with_frequency(freq);
            let analysis = analyze(&profile, "Caminó por el bosque en silencio.");
            assert!(analysis.triggers.is_empty());
            assert_eq!(analysis.relevance_score, 0.0);
            assert!(!analysis.should_intervene, "frequency {:?}", freq);
            assert_eq!(analysis.reason, NO_TRIGGERS_REASON);
        }
    }

    #[test]
    fn name_mention_alone_meets_every_threshold() {
        for freq in ALL_FREQUENCIES {
            let profile = CharacterTriggerProfile::new("c1", "Marco").with_frequency(freq);
            let analysis = analyze(&profile, "y entonces MARCO sonrió");
            assert_eq!(analysis.relevance_score, 1.0);
            assert!(analysis.should_intervene, "frequency {:?}", freq);
        }
    }

    #[test]
    fn topic_emits_one_trigger_per_tag() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe").with_topics(["love"]);
        // Several love keywords present, still one trigger.
        let analysis = analyze(&profile, "Un beso, un corazón roto, puro romance.");
        assert_eq!(analysis.triggers, vec![Trigger::new(TriggerKind::Topic, "love")]);
        assert!((analysis.relevance_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn topic_alone_meets_low_threshold_at_boundary() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe")
            .with_topics(["danger"])
            .with_frequency(InterventionFrequency::Low);
        let analysis = analyze(&profile, "Sintió miedo.");
        assert!(analysis.should_intervene);
    }

    #[test]
    fn unmapped_topic_matches_itself() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe").with_topics(["Dragones"]);
        let analysis = analyze(&profile, "Los dragones volaban.");
        assert_eq!(analysis.triggers.len(), 1);
        assert_eq!(analysis.triggers[0].matched, "Dragones");
    }

    #[test]
    fn trigger_words_are_case_insensitive() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe").with_words(["Espada"]);
        let analysis = analyze(&profile, "levantó la ESPADA");
        assert_eq!(analysis.triggers[0].kind, TriggerKind::Word);
        assert_eq!(analysis.triggers[0].matched, "Espada");
    }

    #[test]
    fn blank_words_are_ignored() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe").with_words(["", "  "]);
        let analysis = analyze(&profile, "cualquier cosa");
        assert!(analysis.triggers.is_empty());
    }

    #[test]
    fn mixed_word_and_topic_pass_low_threshold() {
        let profile = CharacterTriggerProfile::new("c1", "Zoe")
            .with_words(["puerta"])
            .with_topics(["mystery"])
            .with_frequency(InterventionFrequency::Low);
        let analysis = analyze(&profile, "la puerta escondía una pista");
        assert_eq!(analysis.triggers.len(), 2);
        assert!(analysis.should_intervene);
    }

    proptest! {
        #[test]
        fn analysis_is_idempotent(addition in "\\PC{0,120}") {
            let profile = CharacterTriggerProfile::new("c1", "Elena")
                .with_words(["secreto", "llave"])
                .with_topics(["love", "danger", "custom"]);
            let first = serde_json::to_string(&analyze(&profile, &addition)).unwrap();
            let second = serde_json::to_string(&analyze(&profile, &addition)).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn digits_never_trigger(addition in "[0-9 ]{0,60}") {
            for freq in ALL_FREQUENCIES {
                let profile = elena().with_topics(["love", "war"]).with_frequency(freq);
                let analysis = analyze(&profile, &addition);
                prop_assert!(analysis.triggers.is_empty());
                prop_assert_eq!(analysis.relevance_score, 0.0);
                prop_assert!(!analysis.should_intervene);
            }
        }
    }
}
