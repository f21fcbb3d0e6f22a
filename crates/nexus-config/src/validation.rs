// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as severity ranges, URL schemes, and credential pairs.

use nexus_core::types::MAX_SEVERITY;

use crate::diagnostic::ConfigError;
use crate::model::{CounterBackend, NexusConfig, ScreenerKind};

/// Tokenizer encodings the token counter can load.
pub const KNOWN_ENCODINGS: &[&str] = &["o200k_base", "cl100k_base", "p50k_base", "r50k_base"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &NexusConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.host.trim().is_empty() {
        fail("server.host must not be empty".to_string());
    }
    if config.server.port == 0 {
        fail("server.port must not be 0".to_string());
    }

    if config.content_safety.severity_threshold > MAX_SEVERITY {
        fail(format!(
            "content_safety.severity_threshold must be between 0 and {MAX_SEVERITY}, got {}",
            config.content_safety.severity_threshold
        ));
    }
    if config.content_safety.provider == ScreenerKind::Azure {
        if config.content_safety.endpoint.is_none() {
            fail("content_safety.endpoint is required when provider = \"azure\"".to_string());
        }
        if config.content_safety.api_key.is_none() {
            fail("content_safety.api_key is required when provider = \"azure\"".to_string());
        }
    }
    if let Some(endpoint) = &config.content_safety.endpoint
        && let Err(message) = check_endpoint(endpoint)
    {
        fail(format!("content_safety.endpoint: {message}"));
    }
    if let Some(endpoint) = &config.upstream.endpoint
        && let Err(message) = check_endpoint(endpoint)
    {
        fail(format!("upstream.endpoint: {message}"));
    }

    if !(0.0..=1.0).contains(&config.redaction.min_score) {
        fail(format!(
            "redaction.min_score must be between 0.0 and 1.0, got {}",
            config.redaction.min_score
        ));
    }

    if config.rate_limit.tokens_per_window == 0 {
        fail("rate_limit.tokens_per_window must be greater than 0".to_string());
    }
    if config.rate_limit.window_secs == 0 {
        fail("rate_limit.window_secs must be greater than 0".to_string());
    }

    for (name, rate) in [
        ("cost.input_cost_per_1k", config.cost.input_cost_per_1k),
        ("cost.output_cost_per_1k", config.cost.output_cost_per_1k),
    ] {
        if !rate.is_finite() || rate < 0.0 {
            fail(format!("{name} must be a non-negative number, got {rate}"));
        }
    }

    if let Some(encoding) = &config.tokenizer.default_encoding
        && !KNOWN_ENCODINGS.contains(&encoding.as_str())
    {
        fail(format!(
            "tokenizer.default_encoding `{encoding}` is not one of {}",
            KNOWN_ENCODINGS.join(", ")
        ));
    }
    for (model, encoding) in &config.tokenizer.model_aliases {
        if !KNOWN_ENCODINGS.contains(&encoding.as_str()) {
            fail(format!(
                "tokenizer.model_aliases.{model} names unknown encoding `{encoding}`"
            ));
        }
    }

    if config.counters.backend == CounterBackend::Redis {
        let url = config.counters.redis_url.as_str();
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            fail(format!(
                "counters.redis_url must start with redis:// or rediss://, got `{url}`"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Remote endpoints must use HTTPS; loopback hosts may use plain HTTP.
fn check_endpoint(endpoint: &str) -> Result<(), String> {
    let parsed = url::Url::parse(endpoint).map_err(|e| format!("invalid URL: {e}"))?;
    let host = parsed.host_str().unwrap_or("");
    let loopback = matches!(host, "localhost" | "::1" | "[::1]") || host.starts_with("127.");
    if parsed.scheme() != "https" && !loopback {
        return Err(format!("`{endpoint}` must use https"));
    }
    Ok(())
}
