// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat Completions wire types, shared by Azure OpenAI and OpenAI-compatible endpoints.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// Body of `POST .../chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Azure selects the deployment by URL and ignores this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub messages: Vec<ApiMessage>,

    pub max_tokens: u32,

    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

// --- Response types ---

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,

    #[serde(default)]
    pub model: String,

    /// Unix seconds.
    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub usage: ApiUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

// --- Error types ---

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(rename = "type", default)]
    pub type_: Option<String>,

    /// Azure wraps the content-filter reason here.
    #[serde(default)]
    pub innererror: Option<InnerError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerError {
    #[serde(default)]
    pub code: Option<String>,
}

/// Error codes that mean the provider refused the prompt on policy grounds.
const POLICY_CODES: &[&str] = &["content_filter", "ResponsibleAIPolicyViolation"];

/// Finish reason for a completion cut off by the provider's content filter.
pub const CONTENT_FILTER_FINISH: &str = "content_filter";

impl ApiError {
    pub fn is_policy_block(&self) -> bool {
        let outer = self.code.as_deref();
        let inner = self.innererror.as_ref().and_then(|i| i.code.as_deref());
        [outer, inner]
            .into_iter()
            .flatten()
            .any(|code| POLICY_CODES.contains(&code))
    }
}
