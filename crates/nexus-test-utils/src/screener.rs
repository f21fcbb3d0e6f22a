// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A safety screener stub that remembers what it was shown.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use nexus_core::types::{AdapterType, HazardCategory, HealthStatus, SafetyVerdict};
use nexus_core::{NexusError, PluginAdapter, SafetyScreener};

/// Scores text by trigger words and fails on forbidden markers.
///
/// A forbidden marker is a raw PII value a test planted in a prompt; seeing
/// it here means redaction did not run first, so the screen call errors out.
pub struct RecordingScreener {
    threshold: u8,
    triggers: Vec<(String, HazardCategory, u8)>,
    forbidden: Vec<String>,
    inputs: Mutex<Vec<String>>,
}

impl RecordingScreener {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            triggers: Vec::new(),
            forbidden: Vec::new(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Texts containing `word` (case-insensitive) score `severity` in `category`.
    pub fn with_trigger(mut self, word: &str, category: HazardCategory, severity: u8) -> Self {
        self.triggers.push((word.to_lowercase(), category, severity));
        self
    }

    pub fn forbid(mut self, marker: &str) -> Self {
        self.forbidden.push(marker.to_string());
        self
    }

    /// Every text screened so far, oldest first.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PluginAdapter for RecordingScreener {
    fn name(&self) -> &str {
        "recording-screener"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SafetyScreener
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SafetyScreener for RecordingScreener {
    async fn screen(&self, text: &str) -> Result<SafetyVerdict, NexusError> {
        self.inputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());

        if let Some(marker) = self.forbidden.iter().find(|m| text.contains(m.as_str())) {
            return Err(NexusError::Internal(format!(
                "screener received unredacted marker `{marker}`"
            )));
        }

        let lowered = text.to_lowercase();
        let mut severities: BTreeMap<HazardCategory, u8> =
            HazardCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for (word, category, severity) in &self.triggers {
            if lowered.contains(word.as_str()) {
                let entry = severities.entry(*category).or_default();
                *entry = (*entry).max(*severity);
            }
        }
        Ok(SafetyVerdict::new(severities, self.threshold))
    }
}
