// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request pipeline for the Nexus LLM gateway.
//!
//! The [`Pipeline`] is the central coordinator that:
//! - Redacts PII from every message
//! - Screens the redacted text against safety policy
//! - Charges the prompt's tokens against the user's window
//! - Calls the upstream completion provider
//! - Meters tokens and cost into the shared counters

pub mod metrics;
pub mod pipeline;
pub mod response;
pub mod shutdown;
pub mod state;

pub use metrics::{MetricsSnapshot, MetricsStore};
pub use pipeline::{Pipeline, PipelineParts};
pub use response::ChatResponse;
pub use state::RequestState;
