// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the request pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::NexusError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Identifies the role an adapter plays in the gateway.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    TokenCounter,
    Redactor,
    SafetyScreener,
    Upstream,
    CounterStore,
    UserStore,
}

// --- Chat types ---

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single role/content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Same role, replaced content.
    pub fn with_content(&self, content: String) -> Self {
        Self {
            role: self.role,
            content,
        }
    }
}

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const MAX_TOKENS_CEILING: u32 = 128_000;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Inbound chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl ChatRequest {
    /// Checks the payload before any pipeline stage runs.
    pub fn validate(&self) -> Result<(), NexusError> {
        if self.messages.is_empty() {
            return Err(NexusError::Validation(
                "messages must contain at least one message".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(NexusError::Validation("model must not be empty".into()));
        }
        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_CEILING {
            return Err(NexusError::Validation(format!(
                "max_tokens must be between 1 and {MAX_TOKENS_CEILING}"
            )));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(NexusError::Validation(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }
}

// --- Redaction types ---

/// Sensitive entity categories the redactor recognizes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiCategory {
    Person,
    PhoneNumber,
    EmailAddress,
    UsSsn,
    CreditCard,
    Location,
}

impl PiiCategory {
    pub const ALL: [PiiCategory; 6] = [
        PiiCategory::Person,
        PiiCategory::PhoneNumber,
        PiiCategory::EmailAddress,
        PiiCategory::UsSsn,
        PiiCategory::CreditCard,
        PiiCategory::Location,
    ];

    /// The fixed string that replaces a detected span.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Person => "REDACTED-NAME",
            Self::PhoneNumber => "REDACTED-PHONE_NUMBER",
            Self::EmailAddress => "REDACTED-EMAIL",
            Self::UsSsn => "REDACTED-SSN",
            Self::CreditCard => "REDACTED-CREDIT_CARD",
            Self::Location => "REDACTED-LOCATION",
        }
    }
}

/// One detected entity. Offsets are byte offsets into the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub category: PiiCategory,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

/// Output of a redaction pass over one text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RedactionResult {
    pub detections: Vec<Detection>,
    pub cleaned_text: String,
}

impl RedactionResult {
    /// A result for text with nothing to redact.
    pub fn unchanged(text: &str) -> Self {
        Self {
            detections: Vec::new(),
            cleaned_text: text.to_string(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.detections.is_empty()
    }
}

// --- Safety types ---

/// Hazard categories scored by the safety screener.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardCategory {
    Hate,
    SelfHarm,
    Sexual,
    Violence,
}

impl HazardCategory {
    pub const ALL: [HazardCategory; 4] = [
        HazardCategory::Hate,
        HazardCategory::SelfHarm,
        HazardCategory::Sexual,
        HazardCategory::Violence,
    ];
}

/// Highest severity on the eight-level scale.
pub const MAX_SEVERITY: u8 = 7;

/// Per-category severities for one screened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub severities: BTreeMap<HazardCategory, u8>,
    pub threshold: u8,
}

impl SafetyVerdict {
    pub fn new(severities: BTreeMap<HazardCategory, u8>, threshold: u8) -> Self {
        Self {
            severities,
            threshold,
        }
    }

    /// Categories whose severity meets or exceeds the threshold, in category order.
    pub fn violated(&self) -> Vec<HazardCategory> {
        self.severities
            .iter()
            .filter(|(_, severity)| **severity >= self.threshold)
            .map(|(category, _)| *category)
            .collect()
    }

    pub fn blocked(&self) -> bool {
        self.severities
            .values()
            .any(|severity| *severity >= self.threshold)
    }
}

// --- Users ---

/// A gateway user. The API key itself is never held here, only its display prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
}

/// A freshly created user together with the plaintext key, shown once.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user: User,
    pub api_key: String,
}

// --- Rate limiting ---

/// Result of an atomic window charge against the counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCharge {
    pub admitted: bool,
    /// Window usage after the operation.
    pub used: u64,
    /// Seconds until the window expires.
    pub ttl_secs: u64,
    /// Generation of the window that was charged. A new window under the
    /// same key gets a new generation, so refunds can target the old one.
    pub window_id: u64,
}

/// Rate limiter decision reported back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmitResult {
    pub allowed: bool,
    pub used: u64,
    pub requested: u64,
    pub limit: u64,
    pub remaining: u64,
    pub reset_in_seconds: u64,
    /// Window the tokens were charged to.
    #[serde(skip)]
    pub window_id: u64,
}

// --- Upstream ---

/// A completion call sent upstream. Messages are already redacted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Provider-reported token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A completed upstream response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: Option<String>,
    /// Unix seconds, as reported by the provider.
    pub created: i64,
    pub usage: Usage,
}
