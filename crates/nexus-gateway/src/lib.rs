// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the Nexus LLM gateway.
//!
//! Routes authenticated chat requests into the [`nexus_pipeline::Pipeline`],
//! serves aggregate usage counters, and exposes user administration. Every
//! error leaves through [`error::ApiError`] so clients always see a stable
//! machine-readable kind.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{GatewayState, HealthState, router, start_server};
