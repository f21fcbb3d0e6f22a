// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat Completions upstream adapter for the Nexus gateway.
//!
//! This crate implements [`UpstreamProvider`] for Azure OpenAI deployments
//! and OpenAI-compatible servers. Only non-streaming completions are sent.

pub mod client;
pub mod types;

use async_trait::async_trait;
use nexus_config::model::{UpstreamConfig, UpstreamFlavor};
use nexus_core::error::NexusError;
use nexus_core::traits::{PluginAdapter, UpstreamProvider};
use nexus_core::types::{AdapterType, Completion, CompletionRequest, HealthStatus, Usage};
use tracing::{debug, info, warn};

use crate::client::CompletionClient;
use crate::types::{ApiMessage, CONTENT_FILTER_FINISH, ChatCompletionRequest, ChatCompletionResponse};

/// Upstream provider speaking the Chat Completions protocol.
pub struct OpenAiUpstream {
    client: CompletionClient,
}

impl OpenAiUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, NexusError> {
        let client = CompletionClient::new(config)?;
        info!(flavor = ?config.flavor, "upstream provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: CompletionClient) -> Self {
        Self { client }
    }

    fn to_api_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: match self.client.flavor() {
                UpstreamFlavor::Azure => None,
                UpstreamFlavor::Openai => Some(request.model.clone()),
            },
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// Converts a wire response, treating a filtered completion as a policy block.
fn into_completion(response: ChatCompletionResponse) -> Result<Completion, NexusError> {
    let choice = response.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    if finish_reason.as_deref() == Some(CONTENT_FILTER_FINISH) {
        warn!(id = %response.id, "upstream filtered the completion");
        return Err(NexusError::UpstreamPolicyBlock {
            message: "completion was filtered by the upstream content policy".into(),
        });
    }
    let content = choice
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    Ok(Completion {
        id: response.id,
        model: response.model,
        content,
        finish_reason,
        created: response.created,
        usage: Usage {
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
            total_tokens: response.usage.total_tokens,
        },
    })
}

#[async_trait]
impl PluginAdapter for OpenAiUpstream {
    fn name(&self) -> &str {
        match self.client.flavor() {
            UpstreamFlavor::Azure => "azure-openai",
            UpstreamFlavor::Openai => "openai",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        // No health request upstream: completions cost tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NexusError> {
        debug!("upstream provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl UpstreamProvider for OpenAiUpstream {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, NexusError> {
        let api_request = self.to_api_request(&request);
        let response = self.client.complete(&request.model, &api_request).await?;
        into_completion(response)
    }
}
