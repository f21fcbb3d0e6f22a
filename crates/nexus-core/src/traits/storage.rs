// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits: the user store and the shared counter store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::NexusError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewUser, User, WindowCharge};

/// Owns users and their API credentials.
#[async_trait]
pub trait UserStore: PluginAdapter {
    /// Resolves a presented API key to its user, if any.
    async fn lookup(&self, api_key: &str) -> Result<Option<User>, NexusError>;

    /// Creates a user with a freshly generated API key.
    async fn create(&self, name: &str) -> Result<NewUser, NexusError>;

    /// Lists all users, newest first.
    async fn list(&self) -> Result<Vec<User>, NexusError>;

    /// Deletes a user. Returns `false` if no such user existed.
    async fn delete(&self, user_id: &str) -> Result<bool, NexusError>;
}

/// Atomic integer counters keyed by string, with optional expiry.
///
/// Used for both rate-limit windows and process-wide metrics. Every mutation
/// is atomic in the backing store; callers never read-modify-write.
/// Failures surface as [`NexusError::BackingStoreUnavailable`].
#[async_trait]
pub trait CounterStore: PluginAdapter {
    /// Current value, or 0 when the key does not exist or has expired.
    async fn get(&self, key: &str) -> Result<i64, NexusError>;

    /// Overwrites a value, optionally with a time to live.
    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> Result<(), NexusError>;

    /// Atomically adds `delta` (which may be negative) and returns the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, NexusError>;

    /// Sets a time to live on an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, NexusError>;

    /// Remaining time to live in whole seconds, `None` if absent or persistent.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, NexusError>;

    /// Check-and-charge against a fixed window, as one atomic operation.
    ///
    /// Creates the window with `window` expiry when absent. Rejects without
    /// charging when `used + amount >= limit`; otherwise adds `amount`.
    /// Each newly opened window under `key` gets a fresh
    /// [`WindowCharge::window_id`].
    async fn charge_window(
        &self,
        key: &str,
        amount: u64,
        limit: u64,
        window: Duration,
    ) -> Result<WindowCharge, NexusError>;

    /// Gives `amount` back to the window identified by `window_id`, clamped
    /// at zero, keeping its expiry.
    ///
    /// A no-op returning `false` when that window has expired or been
    /// replaced, so a refund never credits a later window.
    async fn refund_window(
        &self,
        key: &str,
        amount: u64,
        window_id: u64,
    ) -> Result<bool, NexusError>;
}
