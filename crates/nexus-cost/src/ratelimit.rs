// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user fixed-window token rate limiting over the shared counter store.
//!
//! Each user has one counter, `{prefix}user:{id}:tokens`, which lives for
//! `window_secs` from the first request of the window. A request is rejected
//! when `used + requested >= limit`; exactly reaching the limit is a
//! rejection. Check and charge happen in one store operation, so concurrent
//! requests from the same user cannot both pass against a stale count.
//!
//! Being a fixed window, a user can spend close to the limit at the end of
//! one window and again at the start of the next, admitting up to twice the
//! limit across the boundary. That is accepted behavior.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use nexus_config::model::RateLimitConfig;
use nexus_core::types::AdmitResult;
use nexus_core::{CounterStore, NexusError};

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u64,
    window: Duration,
    key_prefix: String,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: &RateLimitConfig, key_prefix: &str) -> Self {
        Self {
            store,
            limit: config.tokens_per_window,
            window: Duration::from_secs(config.window_secs),
            key_prefix: key_prefix.to_string(),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counter key holding a user's window usage.
    pub fn key(&self, user_id: &str) -> String {
        format!("{}user:{user_id}:tokens", self.key_prefix)
    }

    /// Checks and, when allowed, charges `requested` tokens to the user's window.
    ///
    /// On rejection nothing is charged and `used` is the unchanged window usage.
    pub async fn admit(&self, user_id: &str, requested: u64) -> Result<AdmitResult, NexusError> {
        let charge = self
            .store
            .charge_window(&self.key(user_id), requested, self.limit, self.window)
            .await?;

        let result = AdmitResult {
            allowed: charge.admitted,
            used: charge.used,
            requested,
            limit: self.limit,
            remaining: self.limit.saturating_sub(charge.used),
            reset_in_seconds: charge.ttl_secs,
            window_id: charge.window_id,
        };

        if result.allowed {
            debug!(
                user_id,
                requested,
                used = result.used,
                remaining = result.remaining,
                "tokens admitted"
            );
        } else {
            info!(
                user_id,
                requested,
                used = result.used,
                limit = self.limit,
                reset_in_seconds = result.reset_in_seconds,
                "token window exhausted"
            );
        }
        Ok(result)
    }

    /// Gives the tokens of an admission back to the window that admitted them.
    ///
    /// The window's expiry is untouched and usage never drops below zero. When
    /// that window has already expired the refund is dropped, so tokens from
    /// an old window never free capacity in the current one. Returns whether
    /// the refund was applied.
    pub async fn refund(&self, user_id: &str, admission: &AdmitResult) -> Result<bool, NexusError> {
        let applied = self
            .store
            .refund_window(&self.key(user_id), admission.requested, admission.window_id)
            .await?;
        if applied {
            debug!(user_id, tokens = admission.requested, "tokens refunded");
        } else {
            debug!(
                user_id,
                tokens = admission.requested,
                "admitting window has expired, refund dropped"
            );
        }
        Ok(applied)
    }
}

/// The client-facing error for a rejected admission.
pub fn exceeded(result: &AdmitResult) -> NexusError {
    NexusError::RateLimitExceeded {
        used: result.used,
        requested: result.requested,
        limit: result.limit,
        remaining: result.remaining,
        reset_in_seconds: result.reset_in_seconds,
    }
}
