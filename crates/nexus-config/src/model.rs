// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Nexus gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use nexus_core::types::PiiCategory;
use serde::{Deserialize, Serialize};

/// Top-level Nexus configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NexusConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream completion provider settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Safety screening settings.
    #[serde(default)]
    pub content_safety: ContentSafetyConfig,

    /// PII redaction settings.
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Per-user token window settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cost estimation rates.
    #[serde(default)]
    pub cost: CostConfig,

    /// Tokenizer registry settings.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Shared counter store settings.
    #[serde(default)]
    pub counters: CountersConfig,

    /// User database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a whole request, upstream call included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Wire dialect spoken by the upstream endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFlavor {
    /// Azure OpenAI deployments (`api-key` header, `api-version` query).
    #[default]
    Azure,
    /// OpenAI-compatible `/v1/chat/completions` with bearer auth.
    Openai,
}

/// Upstream completion provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub flavor: UpstreamFlavor,

    /// Base URL, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_upstream_api_version")]
    pub api_version: String,

    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on 429 and 5xx before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            flavor: UpstreamFlavor::default(),
            endpoint: None,
            api_key: None,
            api_version: default_upstream_api_version(),
            timeout_secs: default_upstream_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_upstream_api_version() -> String {
    "2025-01-01-preview".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    1
}

/// Which safety screener implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenerKind {
    /// Azure AI Content Safety text analysis.
    Azure,
    /// Built-in weighted term lists; works offline.
    #[default]
    Lexicon,
}

/// Safety screening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContentSafetyConfig {
    #[serde(default)]
    pub provider: ScreenerKind,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_safety_api_version")]
    pub api_version: String,

    /// A category at or above this severity (0..=7) blocks the request.
    #[serde(default = "default_severity_threshold")]
    pub severity_threshold: u8,

    #[serde(default = "default_safety_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ContentSafetyConfig {
    fn default() -> Self {
        Self {
            provider: ScreenerKind::default(),
            endpoint: None,
            api_key: None,
            api_version: default_safety_api_version(),
            severity_threshold: default_severity_threshold(),
            timeout_secs: default_safety_timeout_secs(),
        }
    }
}

fn default_safety_api_version() -> String {
    "2024-09-01".to_string()
}

fn default_severity_threshold() -> u8 {
    4
}

fn default_safety_timeout_secs() -> u64 {
    30
}

/// PII redaction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RedactionConfig {
    /// Categories to detect. Unlisted categories pass through untouched.
    #[serde(default = "default_redaction_categories")]
    pub categories: Vec<PiiCategory>,

    /// Detections scoring below this are ignored.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            categories: default_redaction_categories(),
            min_score: default_min_score(),
        }
    }
}

fn default_redaction_categories() -> Vec<PiiCategory> {
    PiiCategory::ALL.to_vec()
}

fn default_min_score() -> f32 {
    0.5
}

/// Per-user token window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests are rejected once `used + requested` reaches this value.
    #[serde(default = "default_tokens_per_window")]
    pub tokens_per_window: u64,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Give admitted tokens back when the upstream call fails.
    #[serde(default)]
    pub refund_on_upstream_failure: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            tokens_per_window: default_tokens_per_window(),
            window_secs: default_window_secs(),
            refund_on_upstream_failure: false,
        }
    }
}

fn default_tokens_per_window() -> u64 {
    1000
}

fn default_window_secs() -> u64 {
    3600
}

/// Cost estimation configuration. Rates are USD per 1,000 tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostConfig {
    #[serde(default = "default_input_cost_per_1k")]
    pub input_cost_per_1k: f64,

    #[serde(default = "default_output_cost_per_1k")]
    pub output_cost_per_1k: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            input_cost_per_1k: default_input_cost_per_1k(),
            output_cost_per_1k: default_output_cost_per_1k(),
        }
    }
}

fn default_input_cost_per_1k() -> f64 {
    0.00015
}

fn default_output_cost_per_1k() -> f64 {
    0.0006
}

/// Tokenizer registry configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenizerConfig {
    /// Encoding for models with no known tokenizer. Unset means such models are rejected.
    #[serde(default)]
    pub default_encoding: Option<String>,

    /// Model name to encoding name (`o200k_base`, `cl100k_base`, `p50k_base`, `r50k_base`).
    #[serde(default)]
    pub model_aliases: BTreeMap<String, String>,
}

/// Where shared counters live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// In-process map; single instance only, lost on restart.
    #[default]
    Memory,
    /// Redis; shared across gateway instances.
    Redis,
}

/// Shared counter store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CountersConfig {
    #[serde(default)]
    pub backend: CounterBackend,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prepended to every key, for sharing one Redis between deployments.
    #[serde(default)]
    pub key_prefix: String,

    #[serde(default = "default_counter_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            backend: CounterBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: String::new(),
            timeout_ms: default_counter_timeout_ms(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_counter_timeout_ms() -> u64 {
    2000
}

/// User database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("nexus").join("nexus.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("nexus.db"))
        .display()
        .to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}
