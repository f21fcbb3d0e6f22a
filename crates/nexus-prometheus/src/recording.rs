// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a
//! no-op. These series are per process; the authoritative usage totals are
//! the shared counters behind `GET /metrics`.

use metrics::{describe_counter, describe_histogram};

/// Register all Nexus metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "nexus_requests_total",
        "Chat completion requests by outcome"
    );
    describe_counter!(
        "nexus_tokens_total",
        "Upstream-reported tokens by model and direction"
    );
    describe_counter!(
        "nexus_cost_micro_usd_total",
        "Estimated spend in micro-USD"
    );
    describe_counter!(
        "nexus_pii_detections_total",
        "PII entities redacted, by category"
    );
    describe_counter!(
        "nexus_safety_violations_total",
        "Hazard categories that blocked a request"
    );
    describe_counter!(
        "nexus_upstream_blocked_total",
        "Requests refused by the upstream content policy"
    );
    describe_histogram!(
        "nexus_request_duration_seconds",
        "End-to-end chat completion latency in seconds"
    );
    describe_histogram!(
        "nexus_upstream_latency_seconds",
        "Upstream completion call latency in seconds"
    );
}

/// Record a finished request. `outcome` is `completed` or an error kind.
pub fn record_request(outcome: &str, seconds: f64) {
    metrics::counter!("nexus_requests_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("nexus_request_duration_seconds").record(seconds);
}

/// Record token consumption.
pub fn record_tokens(model: &str, prompt: u64, completion: u64) {
    metrics::counter!("nexus_tokens_total", "model" => model.to_string(), "type" => "prompt")
        .increment(prompt);
    metrics::counter!("nexus_tokens_total", "model" => model.to_string(), "type" => "completion")
        .increment(completion);
}

pub fn record_cost(micro_usd: u64) {
    metrics::counter!("nexus_cost_micro_usd_total").increment(micro_usd);
}

pub fn record_pii(category: &str) {
    metrics::counter!("nexus_pii_detections_total", "category" => category.to_string())
        .increment(1);
}

pub fn record_safety_violation(category: &str) {
    metrics::counter!("nexus_safety_violations_total", "category" => category.to_string())
        .increment(1);
}

pub fn record_upstream_blocked() {
    metrics::counter!("nexus_upstream_blocked_total").increment(1);
}

pub fn record_upstream_latency(seconds: f64) {
    metrics::histogram!("nexus_upstream_latency_seconds").record(seconds);
}
