// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete pipeline with a mock upstream, an
//! in-memory SQLite user store, and the in-process counter store. The real
//! pattern redactor and tiktoken counter are used, with `test-model`
//! aliased to `cl100k_base`.

use std::sync::Arc;

use nexus_config::model::{CostConfig, NexusConfig, RateLimitConfig};
use nexus_core::types::NewUser;
use nexus_core::{CounterStore, NexusError, SafetyScreener, UserStore};
use nexus_cost::{Pricing, RateLimiter, TiktokenCounter};
use nexus_pipeline::{MetricsStore, Pipeline, PipelineParts};
use nexus_security::PatternRedactor;
use nexus_storage::{Database, MemoryCounterStore, SqliteUserStore};

use crate::mock_upstream::MockUpstream;
use crate::screener::RecordingScreener;

pub const TEST_MODEL: &str = "test-model";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    rate_limit: RateLimitConfig,
    screener: Option<RecordingScreener>,
    counters: Option<Arc<dyn CounterStore>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            screener: None,
            counters: None,
        }
    }

    pub fn with_token_limit(mut self, tokens_per_window: u64) -> Self {
        self.rate_limit.tokens_per_window = tokens_per_window;
        self
    }

    pub fn with_window_secs(mut self, window_secs: u64) -> Self {
        self.rate_limit.window_secs = window_secs;
        self
    }

    pub fn with_refund(mut self, enabled: bool) -> Self {
        self.rate_limit.refund_on_upstream_failure = enabled;
        self
    }

    /// Use this screener instead of a permissive one with threshold 4.
    pub fn with_screener(mut self, screener: RecordingScreener) -> Self {
        self.screener = Some(screener);
        self
    }

    /// Use this counter store instead of a fresh [`MemoryCounterStore`].
    pub fn with_counter_store(mut self, counters: Arc<dyn CounterStore>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, NexusError> {
        let mut config = NexusConfig::default();
        config.rate_limit = self.rate_limit;
        config.cost = CostConfig::default();
        config
            .tokenizer
            .model_aliases
            .insert(TEST_MODEL.to_string(), "cl100k_base".to_string());

        let users = Arc::new(SqliteUserStore::with_database(
            Database::open_in_memory().await?,
        ));
        let counters = self
            .counters
            .unwrap_or_else(|| Arc::new(MemoryCounterStore::new()) as Arc<dyn CounterStore>);
        let upstream = Arc::new(MockUpstream::new());
        let screener = Arc::new(self.screener.unwrap_or_else(|| RecordingScreener::new(4)));
        let token_counter = TiktokenCounter::from_config(&config.tokenizer)?;
        let prefix = config.counters.key_prefix.clone();

        let pipeline = Pipeline::new(PipelineParts {
            redactor: Arc::new(PatternRedactor::new(&config.redaction)),
            screener: screener.clone() as Arc<dyn SafetyScreener>,
            token_counter: Arc::new(token_counter),
            rate_limiter: Arc::new(RateLimiter::new(
                counters.clone(),
                &config.rate_limit,
                &prefix,
            )),
            upstream: upstream.clone(),
            metrics: MetricsStore::new(counters.clone(), &prefix),
            pricing: Pricing::from_config(&config.cost),
            refund_on_upstream_failure: config.rate_limit.refund_on_upstream_failure,
        });

        Ok(TestHarness {
            pipeline: Arc::new(pipeline),
            users,
            counters,
            upstream,
            screener,
            config,
        })
    }
}

/// A complete test environment with mock adapters and in-memory storage.
pub struct TestHarness {
    pub pipeline: Arc<Pipeline>,
    pub users: Arc<SqliteUserStore>,
    pub counters: Arc<dyn CounterStore>,
    /// Call counts and captured requests for assertions.
    pub upstream: Arc<MockUpstream>,
    pub screener: Arc<RecordingScreener>,
    pub config: NexusConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Create a user and return it with its plaintext key.
    pub async fn create_user(&self, name: &str) -> Result<NewUser, NexusError> {
        self.users.create(name).await
    }
}
