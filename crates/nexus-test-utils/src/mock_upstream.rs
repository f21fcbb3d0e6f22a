// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock upstream provider for deterministic testing.
//!
//! `MockUpstream` implements `UpstreamProvider` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls. Every
//! request it receives is kept for later assertions.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use nexus_core::types::{
    AdapterType, Completion, CompletionRequest, HealthStatus, Usage,
};
use nexus_core::{NexusError, PluginAdapter, UpstreamProvider};

/// Usage reported when no reply is queued.
pub const DEFAULT_USAGE: Usage = Usage {
    prompt_tokens: 20,
    completion_tokens: 10,
    total_tokens: 30,
};

enum Scripted {
    Reply { content: String, usage: Usage },
    Fail(NexusError),
}

/// A mock upstream that pops scripted outcomes from a FIFO queue.
///
/// When the queue is empty, a default "mock response" completion is returned.
pub struct MockUpstream {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful completion.
    pub fn push_completion(&self, content: &str, usage: Usage) {
        lock(&self.script).push_back(Scripted::Reply {
            content: content.to_string(),
            usage,
        });
    }

    /// Queue a failure.
    pub fn push_error(&self, err: NexusError) {
        lock(&self.script).push_back(Scripted::Fail(err));
    }

    /// Number of `complete` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

/// Test state stays usable after a panicking test thread.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PluginAdapter for MockUpstream {
    fn name(&self) -> &str {
        "mock-upstream"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Upstream
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl UpstreamProvider for MockUpstream {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, NexusError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let model = request.model.clone();
        lock(&self.requests).push(request);

        let (content, usage) = match lock(&self.script).pop_front() {
            Some(Scripted::Fail(err)) => return Err(err),
            Some(Scripted::Reply { content, usage }) => (content, usage),
            None => ("mock response".to_string(), DEFAULT_USAGE),
        };

        Ok(Completion {
            id: format!("chatcmpl-mock-{n}"),
            model,
            content,
            finish_reason: Some("stop".to_string()),
            created: chrono::Utc::now().timestamp(),
            usage,
        })
    }
}
