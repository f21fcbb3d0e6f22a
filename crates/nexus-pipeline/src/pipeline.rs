// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat request orchestrator.
//!
//! One call to [`Pipeline::process`] runs, strictly in order:
//! 1. redaction then safety screening, message by message, stopping at the
//!    first message that violates policy;
//! 2. a single rate-limit admission for the token count of the redacted prompt;
//! 3. the upstream completion call;
//! 4. metering of provider-reported tokens and cost, plus the request log.
//!
//! The upstream is never called for a rejected request. Tokens admitted in
//! step 2 stay charged if the upstream fails, unless refunds are enabled.
//! No lock is held across any await point; shared state lives in the
//! counter store and is only touched through atomic operations.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use nexus_core::types::{AdmitResult, ChatRequest, Completion, CompletionRequest, Message, User};
use nexus_core::{NexusError, Redactor, SafetyScreener, TokenCounter, UpstreamProvider};
use nexus_cost::pricing::{Pricing, calculate_cost};
use nexus_cost::ratelimit::{RateLimiter, exceeded};

use crate::metrics::MetricsStore;
use crate::response::{ChatResponse, PiiSummary, RateLimitInfo};
use crate::state::{RequestState, RequestTracker};

/// Collaborators the orchestrator is assembled from.
pub struct PipelineParts {
    pub redactor: Arc<dyn Redactor>,
    pub screener: Arc<dyn SafetyScreener>,
    pub token_counter: Arc<dyn TokenCounter>,
    pub rate_limiter: Arc<RateLimiter>,
    pub upstream: Arc<dyn UpstreamProvider>,
    pub metrics: MetricsStore,
    pub pricing: Pricing,
    /// Give admitted tokens back when the upstream call fails.
    pub refund_on_upstream_failure: bool,
}

pub struct Pipeline {
    redactor: Arc<dyn Redactor>,
    screener: Arc<dyn SafetyScreener>,
    token_counter: Arc<dyn TokenCounter>,
    rate_limiter: Arc<RateLimiter>,
    upstream: Arc<dyn UpstreamProvider>,
    metrics: MetricsStore,
    pricing: Pricing,
    refund_on_upstream_failure: bool,
}

/// Messages that made it through redaction and screening.
#[derive(Default)]
struct Screened {
    messages: Vec<Message>,
    pii: PiiSummary,
}

impl Pipeline {
    pub fn new(parts: PipelineParts) -> Self {
        info!(
            redactor = parts.redactor.name(),
            screener = parts.screener.name(),
            upstream = parts.upstream.name(),
            tokens_per_window = parts.rate_limiter.limit(),
            refund_on_upstream_failure = parts.refund_on_upstream_failure,
            "request pipeline initialized"
        );
        Self {
            redactor: parts.redactor,
            screener: parts.screener,
            token_counter: parts.token_counter,
            rate_limiter: parts.rate_limiter,
            upstream: parts.upstream,
            metrics: parts.metrics,
            pricing: parts.pricing,
            refund_on_upstream_failure: parts.refund_on_upstream_failure,
        }
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    pub fn upstream(&self) -> &Arc<dyn UpstreamProvider> {
        &self.upstream
    }

    /// Runs one chat request for an authenticated user.
    pub async fn process(
        &self,
        user: &User,
        request: ChatRequest,
    ) -> Result<ChatResponse, NexusError> {
        let started = Instant::now();
        let mut tracker = RequestTracker::new(uuid::Uuid::new_v4().to_string());

        let result = self.run(&mut tracker, user, request, started).await;
        if let Err(e) = &result {
            tracker.fail(e);
        }

        nexus_prometheus::record_request(
            tracker.state().outcome(),
            started.elapsed().as_secs_f64(),
        );
        debug!(
            request_id = tracker.request_id(),
            state = %tracker.state(),
            "request finished"
        );
        result
    }

    async fn run(
        &self,
        tracker: &mut RequestTracker,
        user: &User,
        request: ChatRequest,
        started: Instant,
    ) -> Result<ChatResponse, NexusError> {
        let local_timestamp = Utc::now();
        request.validate()?;
        // Unknown models are turned away before any counter moves.
        self.token_counter.count(&[], &request.model)?;

        let screened = self.screen_messages(tracker, &request.messages).await?;

        tracker.advance(RequestState::CheckingRateLimit);
        let estimated_prompt_tokens = self
            .token_counter
            .count(&screened.messages, &request.model)?;
        let admission = self
            .rate_limiter
            .admit(&user.user_id, estimated_prompt_tokens)
            .await?;
        if !admission.allowed {
            warn!(
                user_id = user.user_id.as_str(),
                used = admission.used,
                requested = admission.requested,
                limit = admission.limit,
                "rate limit exceeded"
            );
            return Err(exceeded(&admission));
        }

        tracker.advance(RequestState::CallingUpstream);
        let completion = self
            .call_upstream(user, &request, screened.messages.clone(), &admission)
            .await?;

        tracker.advance(RequestState::RecordingMetrics);
        let cost = calculate_cost(&completion.usage, &self.pricing);
        self.metrics
            .record_completion(completion.usage.total_tokens, cost.total_micro())
            .await?;
        nexus_prometheus::record_tokens(
            &request.model,
            completion.usage.prompt_tokens,
            completion.usage.completion_tokens,
        );

        let estimated_costs = cost.usd();
        info!(
            target: "nexus::requests",
            local_timestamp = %local_timestamp.to_rfc3339(),
            upstream_timestamp = %upstream_timestamp(completion.created),
            user_id = user.user_id.as_str(),
            model = request.model.as_str(),
            tokens = completion.usage.total_tokens,
            cost_usd = estimated_costs.total_cost_usd,
            duration_seconds = started.elapsed().as_secs_f64(),
            "request completed"
        );

        tracker.advance(RequestState::Completed);
        Ok(ChatResponse {
            sent_prompt: screened.messages,
            pii_detection: screened.pii,
            upstream_response: completion,
            estimated_prompt_tokens,
            estimated_costs,
            rate_limit_info: RateLimitInfo::from(&admission),
        })
    }

    /// Redacts then screens each message in turn, stopping at the first violation.
    ///
    /// The screener only ever sees redacted text. PII counters move as soon as
    /// a message is redacted, so detections in messages before a blocked one
    /// are still counted. Only the blocking message's categories are counted
    /// as violations.
    async fn screen_messages(
        &self,
        tracker: &mut RequestTracker,
        messages: &[Message],
    ) -> Result<Screened, NexusError> {
        let mut screened = Screened::default();

        for message in messages {
            tracker.advance(RequestState::Redacting);
            let redaction = self.redactor.redact(&message.content).await?;
            for detection in &redaction.detections {
                self.metrics.record_pii(detection.category).await?;
            }
            screened.pii.absorb(&redaction);

            tracker.advance(RequestState::ScreeningSafety);
            let verdict = self.screener.screen(&redaction.cleaned_text).await?;
            if verdict.blocked() {
                let categories = verdict.violated();
                self.metrics.record_safety_violations(&categories).await?;
                warn!(
                    request_id = tracker.request_id(),
                    categories = ?categories,
                    "content safety violation"
                );
                return Err(NexusError::ContentPolicyViolation { categories });
            }

            screened
                .messages
                .push(message.with_content(redaction.cleaned_text));
        }

        Ok(screened)
    }

    async fn call_upstream(
        &self,
        user: &User,
        request: &ChatRequest,
        messages: Vec<Message>,
        admission: &AdmitResult,
    ) -> Result<Completion, NexusError> {
        let upstream_started = Instant::now();
        let result = self
            .upstream
            .complete(CompletionRequest {
                model: request.model.clone(),
                messages,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            })
            .await;
        nexus_prometheus::record_upstream_latency(upstream_started.elapsed().as_secs_f64());

        let err = match result {
            Ok(completion) => return Ok(completion),
            Err(e) => e,
        };

        if let NexusError::UpstreamPolicyBlock { message } = &err {
            warn!(
                user_id = user.user_id.as_str(),
                model = request.model.as_str(),
                reason = message.as_str(),
                "request blocked by upstream content policy"
            );
            if let Err(store_err) = self.metrics.record_upstream_blocked().await {
                warn!(error = %store_err, "failed to count upstream block");
            }
        }

        if self.refund_on_upstream_failure {
            match self.rate_limiter.refund(&user.user_id, admission).await {
                Ok(applied) => debug!(
                    user_id = user.user_id.as_str(),
                    tokens = admission.requested,
                    applied,
                    "token refund after upstream failure"
                ),
                Err(refund_err) => warn!(error = %refund_err, "token refund failed"),
            }
        }

        Err(err)
    }
}

fn upstream_timestamp(created: i64) -> String {
    DateTime::<Utc>::from_timestamp(created, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}
