// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream completion provider trait (Azure OpenAI, OpenAI-compatible, mocks).

use async_trait::async_trait;

use crate::error::NexusError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Completion, CompletionRequest};

/// Adapter for the model that produces completions.
///
/// Implementations fail with [`NexusError::UpstreamPolicyBlock`] when the
/// provider refuses the prompt on policy grounds, and with
/// [`NexusError::Upstream`] or [`NexusError::Timeout`] otherwise.
#[async_trait]
pub trait UpstreamProvider: PluginAdapter {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, NexusError>;
}
