// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A counter store that is always down.

use std::time::Duration;

use async_trait::async_trait;

use nexus_core::types::{AdapterType, HealthStatus, WindowCharge};
use nexus_core::{CounterStore, NexusError, PluginAdapter};

/// Fails every operation with [`NexusError::BackingStoreUnavailable`].
#[derive(Debug, Default)]
pub struct UnavailableCounterStore;

fn unreachable_store() -> NexusError {
    NexusError::backing_store(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused (127.0.0.1:6379)",
    ))
}

#[async_trait]
impl PluginAdapter for UnavailableCounterStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Unhealthy("connection refused".into()))
    }
}

#[async_trait]
impl CounterStore for UnavailableCounterStore {
    async fn get(&self, _key: &str) -> Result<i64, NexusError> {
        Err(unreachable_store())
    }

    async fn set(&self, _key: &str, _value: i64, _ttl: Option<Duration>) -> Result<(), NexusError> {
        Err(unreachable_store())
    }

    async fn incr_by(&self, _key: &str, _delta: i64) -> Result<i64, NexusError> {
        Err(unreachable_store())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, NexusError> {
        Err(unreachable_store())
    }

    async fn ttl(&self, _key: &str) -> Result<Option<u64>, NexusError> {
        Err(unreachable_store())
    }

    async fn charge_window(
        &self,
        _key: &str,
        _amount: u64,
        _limit: u64,
        _window: Duration,
    ) -> Result<WindowCharge, NexusError> {
        Err(unreachable_store())
    }

    async fn refund_window(
        &self,
        _key: &str,
        _amount: u64,
        _window_id: u64,
    ) -> Result<bool, NexusError> {
        Err(unreachable_store())
    }
}
