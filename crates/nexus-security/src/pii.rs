// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-based PII redaction.
//!
//! Each recognizer pairs a regex with a category, a confidence score, and an
//! optional checksum validator (Luhn for cards, area/group/serial rules for
//! SSNs). Candidate spans from all recognizers are merged with one policy:
//!
//! **Leftmost match wins.** Candidates are ordered by start offset; at equal
//! starts the higher score wins, then the longer span, then the category
//! order of [`PiiCategory`]. A candidate overlapping an already accepted span
//! is dropped. Every byte of input is therefore covered by at most one
//! detection, and the outcome does not depend on recognizer order.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use nexus_config::model::RedactionConfig;
use nexus_core::types::{AdapterType, Detection, HealthStatus, PiiCategory, RedactionResult};
use nexus_core::{NexusError, PluginAdapter, Redactor};

struct Recognizer {
    category: PiiCategory,
    regex: Regex,
    /// Capture group holding the entity; 0 for the whole match.
    group: usize,
    score: f32,
    validate: Option<fn(&str) -> bool>,
}

fn recognizer(
    category: PiiCategory,
    pattern: &str,
    group: usize,
    score: f32,
    validate: Option<fn(&str) -> bool>,
) -> Recognizer {
    Recognizer {
        category,
        // Patterns are compile-time constants covered by tests.
        regex: Regex::new(pattern).expect("built-in PII pattern must compile"),
        group,
        score,
        validate,
    }
}

const CITIES: &str = "New York|Los Angeles|Chicago|Houston|Phoenix|Philadelphia|San Antonio|\
San Diego|Dallas|San Francisco|Seattle|Boston|Denver|Atlanta|Miami|Washington|London|Paris|\
Berlin|Madrid|Rome|Tokyo|Toronto|Sydney|Mumbai|Dublin|Amsterdam|Singapore";

static RECOGNIZERS: LazyLock<Vec<Recognizer>> = LazyLock::new(|| {
    vec![
        recognizer(
            PiiCategory::EmailAddress,
            r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b",
            0,
            1.0,
            None,
        ),
        recognizer(
            PiiCategory::CreditCard,
            r"\b\d(?:[ \-]?\d){12,18}\b",
            0,
            1.0,
            Some(luhn_valid),
        ),
        recognizer(
            PiiCategory::UsSsn,
            r"\b\d{3}[- ]\d{2}[- ]\d{4}\b",
            0,
            0.85,
            Some(ssn_valid),
        ),
        recognizer(
            PiiCategory::PhoneNumber,
            r"(?:\+?1[\s.\-]?)?(?:\(\d{3}\)|\b\d{3})[\s.\-]?\d{3}[\s.\-]\d{4}\b",
            0,
            0.75,
            None,
        ),
        recognizer(
            PiiCategory::Person,
            r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            1,
            0.85,
            None,
        ),
        recognizer(
            PiiCategory::Person,
            r"(?i:\bmy name is|\bthis is|\bI am|\bI'm)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            1,
            0.7,
            None,
        ),
        recognizer(
            PiiCategory::Location,
            r"\b\d{1,5}\s+(?:[A-Z][a-z]+\s+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way)\b\.?",
            0,
            0.8,
            None,
        ),
        recognizer(PiiCategory::Location, &format!(r"\b(?:{CITIES})\b"), 0, 0.6, None),
    ]
});

/// Luhn checksum over the digits of `candidate`, ignoring separators.
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// SSA rules: no 000, 666 or 9xx area, no 00 group, no 0000 serial.
pub fn ssn_valid(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return false;
    }
    let (area, rest) = digits.split_at(3);
    let (group, serial) = rest.split_at(2);
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/// Regex recognizers with leftmost-match overlap resolution.
pub struct PatternRedactor {
    enabled: HashSet<PiiCategory>,
    min_score: f32,
}

impl PatternRedactor {
    pub fn new(config: &RedactionConfig) -> Self {
        Self {
            enabled: config.categories.iter().copied().collect(),
            min_score: config.min_score,
        }
    }

    /// Synchronous core of [`Redactor::redact`].
    pub fn redact_text(&self, text: &str) -> RedactionResult {
        let mut candidates: Vec<Detection> = RECOGNIZERS
            .iter()
            .filter(|r| self.enabled.contains(&r.category) && r.score >= self.min_score)
            .flat_map(|r| {
                r.regex.captures_iter(text).filter_map(move |caps| {
                    let m = caps.get(r.group)?;
                    if let Some(validate) = r.validate
                        && !validate(m.as_str())
                    {
                        return None;
                    }
                    Some(Detection {
                        category: r.category,
                        score: r.score,
                        start: m.start(),
                        end: m.end(),
                    })
                })
            })
            .collect();

        if candidates.is_empty() {
            return RedactionResult::unchanged(text);
        }

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.score.total_cmp(&a.score))
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.category.cmp(&b.category))
        });

        let mut detections: Vec<Detection> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let overlaps = detections
                .last()
                .is_some_and(|accepted| candidate.start < accepted.end);
            if !overlaps {
                detections.push(candidate);
            }
        }

        let mut cleaned = String::with_capacity(text.len());
        let mut cursor = 0;
        for detection in &detections {
            cleaned.push_str(&text[cursor..detection.start]);
            cleaned.push_str(detection.category.placeholder());
            cursor = detection.end;
        }
        cleaned.push_str(&text[cursor..]);

        RedactionResult {
            detections,
            cleaned_text: cleaned,
        }
    }
}

#[async_trait]
impl PluginAdapter for PatternRedactor {
    fn name(&self) -> &str {
        "pattern"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Redactor
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl Redactor for PatternRedactor {
    async fn redact(&self, text: &str) -> Result<RedactionResult, NexusError> {
        Ok(self.redact_text(text))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn redactor() -> PatternRedactor {
        PatternRedactor::new(&RedactionConfig::default())
    }

    fn categories(result: &RedactionResult) -> Vec<PiiCategory> {
        result.detections.iter().map(|d| d.category).collect()
    }

    #[test]
    fn all_patterns_compile() {
        assert_eq!(RECOGNIZERS.len(), 8);
    }

    #[test]
    fn redacts_email() {
        let result = redactor().redact_text("reach me at jane.doe@example.com today");
        assert_eq!(categories(&result), vec![PiiCategory::EmailAddress]);
        assert_eq!(result.cleaned_text, "reach me at REDACTED-EMAIL today");
    }

    #[test]
    fn redacts_phone_number() {
        let result = redactor().redact_text("call (555) 123-4567 after five");
        assert_eq!(categories(&result), vec![PiiCategory::PhoneNumber]);
        assert!(!result.cleaned_text.contains("123-4567"));
        assert!(result.cleaned_text.contains("REDACTED-PHONE_NUMBER"));
    }

    #[test]
    fn redacts_valid_ssn_only() {
        let result = redactor().redact_text("ssn 123-45-6789");
        assert_eq!(categories(&result), vec![PiiCategory::UsSsn]);
        assert_eq!(result.cleaned_text, "ssn REDACTED-SSN");

        let invalid = redactor().redact_text("ticket 000-12-3456");
        assert!(invalid.is_clean());
    }

    #[test]
    fn redacts_luhn_valid_card() {
        let result = redactor().redact_text("card 4111 1111 1111 1111 exp 12/29");
        assert_eq!(categories(&result), vec![PiiCategory::CreditCard]);
        assert!(result.cleaned_text.starts_with("card REDACTED-CREDIT_CARD"));

        let not_a_card = redactor().redact_text("order 4111 1111 1111 1112");
        assert!(!categories(&not_a_card).contains(&PiiCategory::CreditCard));
    }

    #[test]
    fn redacts_titled_person_keeping_title() {
        let result = redactor().redact_text("Please ask Dr. Alice Walker about it");
        assert_eq!(categories(&result), vec![PiiCategory::Person]);
        assert_eq!(result.cleaned_text, "Please ask Dr. REDACTED-NAME about it");
    }

    #[test]
    fn redacts_self_introduction() {
        let result = redactor().redact_text("Hi, my name is John Smith.");
        assert_eq!(result.cleaned_text, "Hi, my name is REDACTED-NAME.");
    }

    #[test]
    fn redacts_street_address_and_city() {
        let result = redactor().redact_text("I live at 42 Baker Street in London");
        assert_eq!(
            categories(&result),
            vec![PiiCategory::Location, PiiCategory::Location]
        );
        assert_eq!(
            result.cleaned_text,
            "I live at REDACTED-LOCATION in REDACTED-LOCATION"
        );
    }

    #[test]
    fn counts_each_detection() {
        let result = redactor().redact_text("a@b.io and c@d.io");
        assert_eq!(result.detections.len(), 2);
        assert_eq!(result.cleaned_text, "REDACTED-EMAIL and REDACTED-EMAIL");
    }

    #[test]
    fn overlapping_spans_resolve_to_one_detection() {
        // "Paris" is both a city and the start of a titled name.
        let result = redactor().redact_text("talk to Mr. Paris Adams");
        assert_eq!(categories(&result), vec![PiiCategory::Person]);
        assert_eq!(result.cleaned_text, "talk to Mr. REDACTED-NAME");
    }

    #[test]
    fn leftmost_span_beats_later_higher_score() {
        // The address starts before the titled name inside it, so it wins
        // despite its lower score.
        let result = redactor().redact_text("12 Dr Jones Street");
        assert_eq!(categories(&result), vec![PiiCategory::Location]);
        assert_eq!(result.cleaned_text, "REDACTED-LOCATION");
    }

    #[test]
    fn disabled_category_passes_through() {
        let config = RedactionConfig {
            categories: vec![PiiCategory::UsSsn],
            min_score: 0.5,
        };
        let result = PatternRedactor::new(&config).redact_text("mail x@y.com, ssn 123-45-6789");
        assert_eq!(result.cleaned_text, "mail x@y.com, ssn REDACTED-SSN");
    }

    #[test]
    fn min_score_filters_weak_recognizers() {
        let config = RedactionConfig {
            min_score: 0.9,
            ..RedactionConfig::default()
        };
        let result = PatternRedactor::new(&config).redact_text("flying to Paris, mail a@b.io");
        assert_eq!(categories(&result), vec![PiiCategory::EmailAddress]);
    }

    #[test]
    fn luhn_accepts_known_test_numbers() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5500 0000 0000 0004"));
        assert!(!luhn_valid("1234567812345678"));
    }

    #[tokio::test]
    async fn trait_redact_never_errors_on_clean_text() {
        let result = redactor().redact("nothing to see here").await.unwrap();
        assert!(result.is_clean());
    }

    proptest! {
        #[test]
        fn text_without_entities_is_unchanged(text in "[a-z ,.!?]{0,200}") {
            let result = redactor().redact_text(&text);
            prop_assert!(result.detections.is_empty());
            prop_assert_eq!(result.cleaned_text, text);
        }

        #[test]
        fn single_email_leaves_no_trace(user in "[a-z]{3,12}", domain in "[a-z]{3,12}") {
            let email = format!("{user}@{domain}.com");
            let text = format!("please write to {email} soon");
            let result = redactor().redact_text(&text);
            prop_assert_eq!(result.detections.len(), 1);
            prop_assert!(result.cleaned_text.contains("REDACTED-EMAIL"));
            prop_assert!(!result.cleaned_text.contains(&email));
        }
    }
}
