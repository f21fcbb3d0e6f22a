// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared counter stores backing rate-limit windows and usage metrics.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use nexus_config::model::{CounterBackend, CountersConfig};
use nexus_core::{CounterStore, NexusError};
use tracing::info;

pub use self::memory::MemoryCounterStore;
pub use self::redis::RedisCounterStore;

/// Builds the configured counter store.
pub async fn counter_store_from_config(
    config: &CountersConfig,
) -> Result<Arc<dyn CounterStore>, NexusError> {
    match config.backend {
        CounterBackend::Memory => {
            info!("using in-memory counter store; counts are per instance and lost on restart");
            Ok(Arc::new(MemoryCounterStore::new()))
        }
        CounterBackend::Redis => {
            let store = RedisCounterStore::connect(config).await?;
            info!("using redis counter store");
            Ok(Arc::new(store))
        }
    }
}
