// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt protection for the Nexus gateway.
//!
//! PII redaction, safety screening (Azure Content Safety or the offline
//! lexicon), credential scrubbing for logs, and hardened outbound HTTP clients.

pub mod azure;
pub mod http;
pub mod lexicon;
pub mod pii;
pub mod secrets;

use std::sync::Arc;

use nexus_config::model::{ContentSafetyConfig, ScreenerKind};
use nexus_core::{NexusError, SafetyScreener};

pub use azure::AzureContentSafety;
pub use http::{build_client, join_url, transport_failure};
pub use lexicon::LexiconScreener;
pub use pii::PatternRedactor;
pub use secrets::{ScrubbingWriter, scrub};

/// Build the screener selected by `content_safety.provider`.
pub fn screener_from_config(
    config: &ContentSafetyConfig,
) -> Result<Arc<dyn SafetyScreener>, NexusError> {
    Ok(match config.provider {
        ScreenerKind::Azure => Arc::new(AzureContentSafety::new(config)?),
        ScreenerKind::Lexicon => Arc::new(LexiconScreener::new(config.severity_threshold)),
    })
}
