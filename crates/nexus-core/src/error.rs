// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Nexus gateway.

use thiserror::Error;

use crate::types::HazardCategory;

/// How a failed request ended.
///
/// A rejection is a policy decision (bad input, no budget, unsafe content).
/// A failure means something the gateway depends on did not work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Rejected,
    Failed,
}

/// The primary error type used across all Nexus adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum NexusError {
    /// Malformed request payload.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or unknown credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No tokenizer is registered for the requested model.
    #[error("unsupported model: {model}")]
    UnsupportedModel { model: String },

    /// Screened content met the severity threshold in at least one category.
    #[error("content violates safety policies and cannot be processed")]
    ContentPolicyViolation { categories: Vec<HazardCategory> },

    /// The user's token window cannot absorb the requested tokens.
    #[error("rate limit exceeded: {used} used + {requested} requested >= {limit}")]
    RateLimitExceeded {
        used: u64,
        requested: u64,
        limit: u64,
        remaining: u64,
        reset_in_seconds: u64,
    },

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream provider refused the prompt on content-policy grounds.
    #[error("request blocked by upstream content policy: {message}")]
    UpstreamPolicyBlock { message: String },

    /// The upstream provider failed (transport, non-success status, bad payload).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The content safety service could not screen the text (transport
    /// failure, timeout, non-success status, unreadable verdict).
    #[error("content safety service unavailable: {message}")]
    ScreenerUnavailable {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The shared counter store cannot be reached.
    #[error("backing store unavailable: {source}")]
    BackingStoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// User store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NexusError {
    /// Stable machine-readable kind, used in HTTP error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::UnsupportedModel { .. } => "unsupported_model",
            Self::ContentPolicyViolation { .. } => "content_policy_violation",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::NotFound(_) => "not_found",
            Self::UpstreamPolicyBlock { .. } => "upstream_policy_block",
            Self::Upstream { .. } => "upstream_error",
            Self::ScreenerUnavailable { .. } => "screener_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::BackingStoreUnavailable { .. } => "backing_store_unavailable",
            Self::Storage { .. } => "storage_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Validation(_)
            | Self::Auth(_)
            | Self::UnsupportedModel { .. }
            | Self::ContentPolicyViolation { .. }
            | Self::RateLimitExceeded { .. }
            | Self::NotFound(_) => Disposition::Rejected,
            _ => Disposition::Failed,
        }
    }

    /// Whether the error text may be shown to API clients.
    ///
    /// Infrastructure errors carry driver messages, paths, and hostnames.
    pub fn is_client_safe(&self) -> bool {
        !matches!(
            self,
            Self::BackingStoreUnavailable { .. }
                | Self::Storage { .. }
                | Self::Config(_)
                | Self::Internal(_)
        )
    }

    /// Shorthand for wrapping a counter store failure.
    pub fn backing_store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::BackingStoreUnavailable {
            source: Box::new(err),
        }
    }
}
