// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis-backed counter store, shared by every gateway instance.
//!
//! Plain counter operations map one-to-one onto Redis commands. The window
//! charge runs as a Lua script so the check and the increment are a single
//! atomic step on the server. Every call is bounded by the configured
//! timeout; failures surface as [`NexusError::BackingStoreUnavailable`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use nexus_config::model::CountersConfig;
use nexus_core::types::{AdapterType, HealthStatus, WindowCharge};
use nexus_core::{CounterStore, NexusError, PluginAdapter};

/// KEYS[1] window key, KEYS[2] window generation; ARGV amount, limit,
/// window seconds. Returns {admitted, used, ttl, generation}.
const CHARGE_WINDOW_LUA: &str = r#"
local used = tonumber(redis.call('GET', KEYS[1]) or '0')
local amount = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local generation
if redis.call('TTL', KEYS[1]) < 0 then
  if redis.call('EXISTS', KEYS[1]) == 0 then
    redis.call('SET', KEYS[1], 0)
  end
  redis.call('EXPIRE', KEYS[1], ARGV[3])
  generation = redis.call('INCR', KEYS[2])
else
  generation = tonumber(redis.call('GET', KEYS[2]) or '0')
end
if used + amount >= limit then
  return {0, used, redis.call('TTL', KEYS[1]), generation}
end
used = redis.call('INCRBY', KEYS[1], amount)
return {1, used, redis.call('TTL', KEYS[1]), generation}
"#;

/// KEYS[1] window key, KEYS[2] window generation; ARGV amount, generation.
/// Returns 1 when the refund was applied, 0 when the window is gone.
const REFUND_WINDOW_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end
if tonumber(redis.call('GET', KEYS[2]) or '0') ~= tonumber(ARGV[2]) then
  return 0
end
local left = redis.call('DECRBY', KEYS[1], ARGV[1])
if left < 0 then
  redis.call('INCRBY', KEYS[1], -left)
end
return 1
"#;

/// Companion key holding the generation of the window stored at `key`.
/// It has no expiry so generations never repeat.
fn generation_key(key: &str) -> String {
    format!("{key}:window")
}

pub struct RedisCounterStore {
    connection: ConnectionManager,
    charge_script: redis::Script,
    refund_script: redis::Script,
    timeout: Duration,
}

impl RedisCounterStore {
    /// Connects to the configured Redis. Fails fast if the server is unreachable.
    pub async fn connect(config: &CountersConfig) -> Result<Self, NexusError> {
        let client =
            redis::Client::open(config.redis_url.as_str()).map_err(NexusError::backing_store)?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let connection = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(NexusError::backing_store)?
            .map_err(NexusError::backing_store)?;

        debug!(
            prefix = %config.key_prefix,
            timeout_ms = config.timeout_ms,
            "redis counter store connected"
        );
        Ok(Self {
            connection,
            charge_script: redis::Script::new(CHARGE_WINDOW_LUA),
            refund_script: redis::Script::new(REFUND_WINDOW_LUA),
            timeout,
        })
    }

    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, NexusError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "redis command failed");
                Err(NexusError::backing_store(e))
            }
            Err(elapsed) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "redis command timed out");
                Err(NexusError::backing_store(elapsed))
            }
        }
    }
}

fn ttl_reply(raw: i64) -> Option<u64> {
    // -2 missing, -1 no expiry
    u64::try_from(raw).ok()
}

#[async_trait]
impl PluginAdapter for RedisCounterStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        let mut conn = self.connection.clone();
        let pong: Result<String, _> = self
            .run("PING", async { redis::cmd("PING").query_async(&mut conn).await })
            .await;
        Ok(match pong {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<i64, NexusError> {
        let mut conn = self.connection.clone();
        let value: Option<i64> = self
            .run("GET", async { redis::cmd("GET").arg(key).query_async(&mut conn).await })
            .await?;
        Ok(value.unwrap_or(0))
    }

    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> Result<(), NexusError> {
        let mut conn = self.connection.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = self
            .run("SET", async { cmd.query_async(&mut conn).await })
            .await?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, NexusError> {
        let mut conn = self.connection.clone();
        self.run("INCRBY", async {
            redis::cmd("INCRBY").arg(key).arg(delta).query_async(&mut conn).await
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, NexusError> {
        let mut conn = self.connection.clone();
        let set: i64 = self
            .run("EXPIRE", async {
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(ttl.as_secs().max(1))
                    .query_async(&mut conn)
                    .await
            })
            .await?;
        Ok(set == 1)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, NexusError> {
        let mut conn = self.connection.clone();
        let raw: i64 = self
            .run("TTL", async { redis::cmd("TTL").arg(key).query_async(&mut conn).await })
            .await?;
        Ok(ttl_reply(raw))
    }

    async fn charge_window(
        &self,
        key: &str,
        amount: u64,
        limit: u64,
        window: Duration,
    ) -> Result<WindowCharge, NexusError> {
        let mut conn = self.connection.clone();
        let window_secs = window.as_secs().max(1);
        let (admitted, used, ttl, generation): (i64, i64, i64, i64) = self
            .run("EVALSHA", async {
                self.charge_script
                    .key(key)
                    .key(generation_key(key))
                    .arg(amount)
                    .arg(limit)
                    .arg(window_secs)
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;

        Ok(WindowCharge {
            admitted: admitted == 1,
            used: u64::try_from(used).unwrap_or(0),
            ttl_secs: ttl_reply(ttl).unwrap_or(window_secs),
            window_id: u64::try_from(generation).unwrap_or(0),
        })
    }

    async fn refund_window(
        &self,
        key: &str,
        amount: u64,
        window_id: u64,
    ) -> Result<bool, NexusError> {
        let mut conn = self.connection.clone();
        let applied: i64 = self
            .run("EVALSHA", async {
                self.refund_script
                    .key(key)
                    .key(generation_key(key))
                    .arg(amount)
                    .arg(window_id)
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;
        Ok(applied == 1)
    }
}
