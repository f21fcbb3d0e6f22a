// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nexus.toml` > `~/.config/nexus/nexus.toml` > `/etc/nexus/nexus.toml`
//! with environment variable overrides via the `NEXUS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use url::Url;

use crate::model::NexusConfig;

/// Top-level sections, longest first so `rate_limit_` wins over shorter prefixes.
const SECTIONS: &[&str] = &[
    "content_safety",
    "rate_limit",
    "prometheus",
    "tokenizer",
    "redaction",
    "counters",
    "upstream",
    "storage",
    "logging",
    "server",
    "cost",
];

/// Variable names used by earlier deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("azure_openai_endpoint", "upstream.endpoint"),
    ("azure_openai_api_key", "upstream.api_key"),
    ("azure_openai_api_version", "upstream.api_version"),
    ("azure_content_safety_endpoint", "content_safety.endpoint"),
    ("azure_content_safety_key", "content_safety.api_key"),
    ("redis_url", "counters.redis_url"),
    ("rate_limit_tokens", "rate_limit.tokens_per_window"),
    ("rate_limit_window_seconds", "rate_limit.window_secs"),
    ("input_cost_per_1k", "cost.input_cost_per_1k"),
    ("output_cost_per_1k", "cost.output_cost_per_1k"),
    ("log_level", "logging.level"),
    ("log_file", "logging.file"),
];

/// Paths searched for config files, lowest precedence first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/nexus/nexus.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("nexus").join("nexus.toml"));
    }
    paths.push(PathBuf::from("nexus.toml"));
    paths
}

/// Build the Figment used for config loading.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nexus/nexus.toml`, `~/.config/nexus/nexus.toml`, `./nexus.toml`
/// 3. `explicit`, when given (e.g. `--config`)
/// 4. Legacy `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD`
/// 5. Other legacy environment variables (`AZURE_OPENAI_ENDPOINT`, `REDIS_URL`, ...)
/// 6. `NEXUS_*` environment variables
pub fn build_figment(explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(NexusConfig::default()));
    for path in config_search_paths() {
        figment = figment.merge(Toml::file(path));
    }
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }
    if let Some(url) = legacy_redis_url() {
        figment = figment
            .merge(Serialized::default("counters.backend", "redis"))
            .merge(Serialized::default("counters.redis_url", url));
    }
    figment.merge(legacy_env_provider()).merge(env_provider())
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<NexusConfig, figment::Error> {
    build_figment(None).extract()
}

/// Load configuration with an additional explicit file on top of the hierarchy.
pub fn load_config_from_path(path: &Path) -> Result<NexusConfig, figment::Error> {
    build_figment(Some(path)).extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<NexusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NexusConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Map a lowercased, prefix-stripped variable name to a dotted config key.
///
/// Splits on the first section boundary only, so `rate_limit_window_secs`
/// becomes `rate_limit.window_secs` rather than `rate.limit.window.secs`.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("NEXUS_").map(|key| map_env_key(key.as_str()).into())
}

fn map_legacy_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    LEGACY_ENV
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, mapped)| (*mapped).to_string())
        .unwrap_or(key)
}

fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(legacy, _)| *legacy).collect();
    Env::raw()
        .only(&names)
        .map(|key| map_legacy_key(key.as_str()).into())
}

/// Builds `redis://[:password@]host:port` from the split variables earlier
/// deployments used. `None` when none of them is set.
///
/// Host defaults to `localhost` and port to `6379`. The password is
/// percent-encoded. A host or port that does not form a URL is passed through
/// verbatim so validation and connect report it.
fn legacy_redis_url() -> Option<String> {
    let host = std::env::var("REDIS_HOST").ok();
    let port = std::env::var("REDIS_PORT").ok();
    let password = std::env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty());
    if host.is_none() && port.is_none() && password.is_none() {
        return None;
    }
    Some(redis_url(
        host.as_deref().unwrap_or("localhost"),
        port.as_deref().unwrap_or("6379"),
        password.as_deref(),
    ))
}

fn redis_url(host: &str, port: &str, password: Option<&str>) -> String {
    let raw = format!("redis://{host}:{port}");
    let Ok(mut url) = Url::parse(&raw) else {
        return raw;
    };
    if let Some(password) = password {
        if url.set_password(Some(password)).is_err() {
            return raw;
        }
    }
    url.to_string()
}
