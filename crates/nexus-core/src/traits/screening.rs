// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt inspection traits: token counting, redaction, safety screening.

use async_trait::async_trait;

use crate::error::NexusError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, RedactionResult, SafetyVerdict};

/// Counts billing units for a set of messages under a model's tokenizer.
pub trait TokenCounter: Send + Sync + 'static {
    /// Fails with [`NexusError::UnsupportedModel`] when no tokenizer is registered.
    fn count(&self, messages: &[Message], model: &str) -> Result<u64, NexusError>;
}

/// Detects and replaces sensitive entities in free text.
#[async_trait]
pub trait Redactor: PluginAdapter {
    /// Absence of entities is a normal outcome, never an error.
    async fn redact(&self, text: &str) -> Result<RedactionResult, NexusError>;
}

/// Scores text against the hazard categories.
///
/// Only ever called with redacted text.
#[async_trait]
pub trait SafetyScreener: PluginAdapter {
    async fn screen(&self, text: &str) -> Result<SafetyVerdict, NexusError>;
}
