// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Nexus LLM gateway.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Nexus workspace. Every pluggable
//! capability (redactor, screener, upstream, stores) implements traits
//! defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Disposition, NexusError};
pub use types::{AdapterType, HealthStatus};

pub use traits::{
    CounterStore, PluginAdapter, Redactor, SafetyScreener, TokenCounter, UpstreamProvider,
    UserStore,
};
