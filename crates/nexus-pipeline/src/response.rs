// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body returned for a completed chat request.

use serde::Serialize;

use nexus_core::types::{AdmitResult, Completion, Message, PiiCategory, RedactionResult};
use nexus_cost::CostUsd;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    /// The redacted messages actually sent upstream.
    pub sent_prompt: Vec<Message>,
    pub pii_detection: PiiSummary,
    /// The provider's completion, as returned by the upstream adapter.
    pub upstream_response: Completion,
    /// Local tokenizer estimate for the redacted prompt, used for admission.
    pub estimated_prompt_tokens: u64,
    pub estimated_costs: CostUsd,
    pub rate_limit_info: RateLimitInfo,
}

/// Detections across all messages of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PiiSummary {
    pub detected: bool,
    /// Distinct categories in first-seen order.
    pub entities_redacted: Vec<PiiCategory>,
    pub total_detections: usize,
}

impl PiiSummary {
    pub fn absorb(&mut self, result: &RedactionResult) {
        for detection in &result.detections {
            if !self.entities_redacted.contains(&detection.category) {
                self.entities_redacted.push(detection.category);
            }
        }
        self.total_detections += result.detections.len();
        self.detected = self.total_detections > 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub tokens_used: u64,
    pub tokens_limit: u64,
    pub tokens_remaining: u64,
    pub reset_in_seconds: u64,
}

impl From<&AdmitResult> for RateLimitInfo {
    fn from(r: &AdmitResult) -> Self {
        Self {
            tokens_used: r.used,
            tokens_limit: r.limit,
            tokens_remaining: r.remaining,
            reset_in_seconds: r.reset_in_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use nexus_core::types::{Detection, Usage};

    use super::*;

    fn detection(category: PiiCategory) -> Detection {
        Detection {
            category,
            score: 0.9,
            start: 0,
            end: 1,
        }
    }

    #[test]
    fn summary_keeps_first_seen_order() {
        let mut summary = PiiSummary::default();
        summary.absorb(&RedactionResult {
            detections: vec![
                detection(PiiCategory::PhoneNumber),
                detection(PiiCategory::EmailAddress),
            ],
            cleaned_text: String::new(),
        });
        summary.absorb(&RedactionResult {
            detections: vec![
                detection(PiiCategory::EmailAddress),
                detection(PiiCategory::Person),
            ],
            cleaned_text: String::new(),
        });

        assert!(summary.detected);
        assert_eq!(summary.total_detections, 4);
        assert_eq!(
            summary.entities_redacted,
            vec![
                PiiCategory::PhoneNumber,
                PiiCategory::EmailAddress,
                PiiCategory::Person
            ]
        );
    }

    #[test]
    fn upstream_response_serializes_as_the_completion() {
        let completion = Completion {
            id: "chatcmpl-1".into(),
            model: "gpt-4o-mini".into(),
            content: "hi".into(),
            finish_reason: Some("stop".into()),
            created: 1_700_000_000,
            usage: Usage {
                prompt_tokens: 3,
                completion_tokens: 1,
                total_tokens: 4,
            },
        };
        let response = ChatResponse {
            sent_prompt: Vec::new(),
            pii_detection: PiiSummary::default(),
            upstream_response: completion.clone(),
            estimated_prompt_tokens: 3,
            estimated_costs: CostUsd {
                input_cost_usd: 0.0,
                output_cost_usd: 0.0,
                total_cost_usd: 0.0,
            },
            rate_limit_info: RateLimitInfo {
                tokens_used: 3,
                tokens_limit: 1000,
                tokens_remaining: 997,
                reset_in_seconds: 60,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["upstream_response"],
            serde_json::to_value(&completion).unwrap()
        );
        assert_eq!(json["upstream_response"]["finish_reason"], "stop");
        assert_eq!(json["upstream_response"]["usage"]["total_tokens"], 4);
    }

    #[test]
    fn clean_text_leaves_summary_empty() {
        let mut summary = PiiSummary::default();
        summary.absorb(&RedactionResult::unchanged("hello"));
        assert!(!summary.detected);
        assert!(summary.entities_redacted.is_empty());
    }
}
