// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters except the token counter extend the [`PluginAdapter`] base
//! trait and use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod provider;
pub mod screening;
pub mod storage;

pub use adapter::PluginAdapter;
pub use provider::UpstreamProvider;
pub use screening::{Redactor, SafetyScreener, TokenCounter};
pub use storage::{CounterStore, UserStore};
