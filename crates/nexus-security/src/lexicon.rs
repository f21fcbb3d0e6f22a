// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline safety screener over weighted term lists.
//!
//! Each hazard category has a list of phrases with a severity on the
//! eight-level scale. A text's severity in a category is the highest weight
//! among the phrases it contains (whole-word, case-insensitive).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use nexus_core::types::{AdapterType, HazardCategory, HealthStatus, SafetyVerdict};
use nexus_core::{NexusError, PluginAdapter, SafetyScreener};

const TERMS: &[(HazardCategory, &str, u8)] = &[
    (HazardCategory::Violence, "kill", 2),
    (HazardCategory::Violence, "attack", 2),
    (HazardCategory::Violence, "stab", 4),
    (HazardCategory::Violence, "shoot", 4),
    (HazardCategory::Violence, "assault", 4),
    (HazardCategory::Violence, "beat (?:him|her|them|you) up", 4),
    (HazardCategory::Violence, "kill (?:him|her|them|you|everyone)", 6),
    (HazardCategory::Violence, "murder", 6),
    (HazardCategory::Violence, "build a bomb", 6),
    (HazardCategory::Violence, "massacre", 6),
    (HazardCategory::Violence, "torture", 6),
    (HazardCategory::Hate, "vermin", 4),
    (HazardCategory::Hate, "subhuman", 6),
    (HazardCategory::Hate, "inferior race", 6),
    (HazardCategory::Hate, "ethnic cleansing", 7),
    (HazardCategory::SelfHarm, "self-harm", 4),
    (HazardCategory::SelfHarm, "suicide", 4),
    (HazardCategory::SelfHarm, "cut myself", 6),
    (HazardCategory::SelfHarm, "kill myself", 6),
    (HazardCategory::SelfHarm, "end my life", 6),
    (HazardCategory::Sexual, "sexual", 2),
    (HazardCategory::Sexual, "nude", 2),
    (HazardCategory::Sexual, "porn", 4),
    (HazardCategory::Sexual, "explicit sex", 6),
];

static COMPILED: LazyLock<Vec<(HazardCategory, Regex, u8)>> = LazyLock::new(|| {
    TERMS
        .iter()
        .map(|(category, phrase, weight)| {
            let regex = Regex::new(&format!(r"(?i)\b{phrase}\b"))
                .expect("built-in lexicon phrase must compile");
            (*category, regex, *weight)
        })
        .collect()
});

/// Term-list screener. Always reports a severity for every category.
pub struct LexiconScreener {
    threshold: u8,
}

impl LexiconScreener {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn score(&self, text: &str) -> SafetyVerdict {
        let mut severities: BTreeMap<HazardCategory, u8> =
            HazardCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for (category, regex, weight) in COMPILED.iter() {
            if regex.is_match(text) {
                let entry = severities.entry(*category).or_default();
                *entry = (*entry).max(*weight);
            }
        }
        debug!(?severities, "lexicon screening complete");
        SafetyVerdict::new(severities, self.threshold)
    }
}

#[async_trait]
impl PluginAdapter for LexiconScreener {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SafetyScreener
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SafetyScreener for LexiconScreener {
    async fn screen(&self, text: &str) -> Result<SafetyVerdict, NexusError> {
        Ok(self.score(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_text_scores_zero_everywhere() {
        let verdict = LexiconScreener::new(4).score("What is the capital of France?");
        assert!(!verdict.blocked());
        assert!(verdict.severities.values().all(|s| *s == 0));
        assert_eq!(verdict.severities.len(), 4);
    }

    #[test]
    fn highest_matching_weight_wins() {
        let verdict = LexiconScreener::new(4).score("I will attack and then murder them");
        assert_eq!(verdict.severities[&HazardCategory::Violence], 6);
        assert_eq!(verdict.violated(), vec![HazardCategory::Violence]);
    }

    #[test]
    fn low_weight_terms_stay_under_default_threshold() {
        let verdict = LexiconScreener::new(4).score("how do I kill a zombie process");
        assert_eq!(verdict.severities[&HazardCategory::Violence], 2);
        assert!(!verdict.blocked());
    }

    #[test]
    fn only_categories_at_threshold_are_violated() {
        let verdict = LexiconScreener::new(4).score("nude torture scene");
        assert_eq!(verdict.violated(), vec![HazardCategory::Violence]);
        assert_eq!(verdict.severities[&HazardCategory::Sexual], 2);
    }

    #[test]
    fn matching_is_whole_word_and_case_insensitive() {
        let screener = LexiconScreener::new(4);
        assert!(screener.score("MURDER mystery").blocked());
        assert!(!screener.score("skilled workers").blocked());
    }

    #[tokio::test]
    async fn screen_trait_delegates_to_score() {
        let verdict = LexiconScreener::new(6).screen("ethnic cleansing").await.unwrap();
        assert_eq!(verdict.violated(), vec![HazardCategory::Hate]);
    }
}
