// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage counters kept in the shared counter store.
//!
//! Every mutation is a single `incr_by`, so concurrent requests and other
//! gateway instances sharing the store never lose an update. Counters are
//! only ever incremented. Each write is mirrored to the Prometheus recorder
//! when one is installed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use nexus_core::types::{HazardCategory, PiiCategory};
use nexus_core::{CounterStore, NexusError};
use nexus_cost::pricing::micro_to_usd;

const TOTAL_REQUESTS: &str = "metrics:total_requests";
const TOTAL_TOKENS: &str = "metrics:total_tokens";
const TOTAL_COST_MICRO_USD: &str = "metrics:total_cost_micro_usd";
const UPSTREAM_BLOCKED: &str = "metrics:upstream_blocked_requests";

/// Handle to the process-wide usage counters.
#[derive(Clone)]
pub struct MetricsStore {
    store: Arc<dyn CounterStore>,
    key_prefix: String,
}

impl MetricsStore {
    pub fn new(store: Arc<dyn CounterStore>, key_prefix: &str) -> Self {
        Self {
            store,
            key_prefix: key_prefix.to_string(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{name}", self.key_prefix)
    }

    fn pii_key(&self, category: PiiCategory) -> String {
        self.key(&format!("metrics:pii:{category}"))
    }

    fn safety_key(&self, category: HazardCategory) -> String {
        self.key(&format!("metrics:content_safety:{category}"))
    }

    pub async fn record_pii(&self, category: PiiCategory) -> Result<(), NexusError> {
        self.store.incr_by(&self.pii_key(category), 1).await?;
        nexus_prometheus::record_pii(&category.to_string());
        Ok(())
    }

    /// One increment per violated category.
    pub async fn record_safety_violations(
        &self,
        categories: &[HazardCategory],
    ) -> Result<(), NexusError> {
        for category in categories {
            self.store.incr_by(&self.safety_key(*category), 1).await?;
            nexus_prometheus::record_safety_violation(&category.to_string());
        }
        Ok(())
    }

    pub async fn record_upstream_blocked(&self) -> Result<(), NexusError> {
        self.store.incr_by(&self.key(UPSTREAM_BLOCKED), 1).await?;
        nexus_prometheus::record_upstream_blocked();
        Ok(())
    }

    /// Counts one successful completion with its provider-reported tokens and cost.
    pub async fn record_completion(
        &self,
        total_tokens: u64,
        cost_micro_usd: u64,
    ) -> Result<(), NexusError> {
        self.store.incr_by(&self.key(TOTAL_REQUESTS), 1).await?;
        self.store
            .incr_by(&self.key(TOTAL_TOKENS), saturating_i64(total_tokens))
            .await?;
        self.store
            .incr_by(&self.key(TOTAL_COST_MICRO_USD), saturating_i64(cost_micro_usd))
            .await?;
        nexus_prometheus::record_cost(cost_micro_usd);
        Ok(())
    }

    /// Reads every counter. Unset counters read as zero.
    pub async fn snapshot(&self) -> Result<MetricsSnapshot, NexusError> {
        let total_requests = self.store.get(&self.key(TOTAL_REQUESTS)).await?;
        let total_tokens = self.store.get(&self.key(TOTAL_TOKENS)).await?;
        let cost_micro = self.store.get(&self.key(TOTAL_COST_MICRO_USD)).await?;
        let upstream_blocked = self.store.get(&self.key(UPSTREAM_BLOCKED)).await?;

        let mut pii_detections = BTreeMap::new();
        for category in PiiCategory::ALL {
            let count = self.store.get(&self.pii_key(category)).await?;
            pii_detections.insert(category, count);
        }

        let mut content_safety_violations = BTreeMap::new();
        for category in HazardCategory::ALL {
            let count = self.store.get(&self.safety_key(category)).await?;
            content_safety_violations.insert(category, count);
        }

        Ok(MetricsSnapshot {
            overview: Overview {
                total_requests,
                total_tokens,
                total_cost_usd: micro_to_usd(cost_micro),
                upstream_blocked_requests: upstream_blocked,
            },
            pii_detections,
            content_safety_violations,
        })
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Aggregate counters as served by `GET /metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub overview: Overview,
    pub pii_detections: BTreeMap<PiiCategory, i64>,
    pub content_safety_violations: BTreeMap<HazardCategory, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_requests: i64,
    pub total_tokens: i64,
    pub total_cost_usd: f64,
    pub upstream_blocked_requests: i64,
}
