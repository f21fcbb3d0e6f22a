// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token accounting for the Nexus gateway.
//!
//! This crate provides:
//! - **Token counting**: tiktoken-based prompt estimation with per-message overheads
//! - **Rate limiting**: per-user fixed token windows over the shared counter store
//! - **Pricing**: exact per-token cost in pico-USD, accumulated in micro-USD

pub mod pricing;
pub mod ratelimit;
pub mod tokens;

pub use pricing::{CostBreakdown, CostUsd, Pricing, calculate_cost};
pub use ratelimit::RateLimiter;
pub use tokens::TiktokenCounter;
