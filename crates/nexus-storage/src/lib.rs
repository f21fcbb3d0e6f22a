// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the Nexus gateway.
//!
//! Users and their hashed API keys live in WAL-mode SQLite with embedded
//! migrations, accessed through `tokio-rusqlite`'s single writer thread.
//! Rate-limit windows and usage counters live in a [`CounterStore`]:
//! in process for a single instance, or in Redis when shared.
//!
//! [`CounterStore`]: nexus_core::CounterStore

pub mod adapter;
pub mod counters;
pub mod database;
pub mod keys;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteUserStore;
pub use counters::{MemoryCounterStore, RedisCounterStore, counter_store_from_config};
pub use database::Database;
