// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Nexus integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockUpstream`] - Mock completion provider with scripted replies
//! - [`RecordingScreener`] - Screener stub that records its inputs
//! - [`UnavailableCounterStore`] - Counter store that is always down
//! - [`TestHarness`] - In-memory pipeline assembled from the above

pub mod counters;
pub mod harness;
pub mod mock_upstream;
pub mod screener;

pub use counters::UnavailableCounterStore;
pub use harness::{TEST_MODEL, TestHarness};
pub use mock_upstream::MockUpstream;
pub use screener::RecordingScreener;
