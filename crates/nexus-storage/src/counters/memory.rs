// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process counter store.
//!
//! Every operation holds the DashMap shard lock for its key, which makes
//! read-check-write sequences such as [`CounterStore::charge_window`] atomic
//! with respect to other tasks. Expiry is lazy: an expired entry reads as
//! absent and is replaced on the next write. Uses `tokio::time::Instant` so
//! tests can drive windows with a paused clock.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use nexus_core::types::{AdapterType, HealthStatus, WindowCharge};
use nexus_core::{CounterStore, NexusError, PluginAdapter};

#[derive(Debug)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
    /// Bumped each time `charge_window` opens a new window on this key.
    generation: u64,
}

impl Entry {
    fn empty() -> Self {
        Self {
            value: 0,
            expires_at: None,
            generation: 0,
        }
    }

    fn live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }

    fn ttl_secs(&self, now: Instant) -> Option<u64> {
        self.expires_at.map(|at| ceil_secs(at.saturating_duration_since(now)))
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Single-instance [`CounterStore`]. Counts are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryCounterStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<i64, NexusError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|e| e.live(now))
            .map_or(0, |e| e.value))
    }

    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> Result<(), NexusError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry::empty());
        entry.value = value;
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, NexusError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry::empty());
        if !entry.live(now) {
            entry.value = 0;
            entry.expires_at = None;
        }
        entry.value = entry.value.saturating_add(delta);
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, NexusError> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, NexusError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|e| e.live(now))
            .and_then(|e| e.ttl_secs(now)))
    }

    async fn charge_window(
        &self,
        key: &str,
        amount: u64,
        limit: u64,
        window: Duration,
    ) -> Result<WindowCharge, NexusError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry::empty());
        if !entry.live(now) {
            entry.value = 0;
            entry.expires_at = None;
        }
        if entry.expires_at.is_none() {
            // Opens a window. A key written only by `incr_by` keeps its count.
            entry.expires_at = Some(now + window);
            entry.generation += 1;
        }

        let used = u64::try_from(entry.value).unwrap_or(0);
        let ttl_secs = entry.ttl_secs(now).unwrap_or(window.as_secs());
        let window_id = entry.generation;
        if used.saturating_add(amount) >= limit {
            return Ok(WindowCharge {
                admitted: false,
                used,
                ttl_secs,
                window_id,
            });
        }

        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        entry.value = entry.value.max(0).saturating_add(amount);
        Ok(WindowCharge {
            admitted: true,
            used: u64::try_from(entry.value).unwrap_or(0),
            ttl_secs,
            window_id,
        })
    }

    async fn refund_window(
        &self,
        key: &str,
        amount: u64,
        window_id: u64,
    ) -> Result<bool, NexusError> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.live(now) && entry.generation == window_id => {
                let amount = i64::try_from(amount).unwrap_or(i64::MAX);
                entry.value = entry.value.saturating_sub(amount).max(0);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
