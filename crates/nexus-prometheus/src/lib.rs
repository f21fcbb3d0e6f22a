// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics exporter for the Nexus gateway.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method,
//! which is exposed through the gateway's `/metrics/prometheus` endpoint.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use nexus_core::NexusError;

pub use recording::{
    record_cost, record_pii, record_request, record_safety_violation, record_tokens,
    record_upstream_blocked, record_upstream_latency,
};

/// Prometheus metrics exporter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process. Returns an error if a
    /// recorder is already installed.
    pub fn install() -> Result<Self, NexusError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            NexusError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_recorder(f: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = PrometheusExporter::from_handle(recorder.handle());
        metrics::with_local_recorder(&recorder, || {
            recording::register_metrics();
            f();
        });
        exporter.render()
    }

    #[test]
    fn request_outcomes_are_labelled() {
        let text = with_recorder(|| {
            record_request("completed", 0.2);
            record_request("completed", 0.3);
            record_request("rate_limit_exceeded", 0.01);
        });
        assert!(text.contains(r#"nexus_requests_total{outcome="completed"} 2"#), "{text}");
        assert!(text.contains(r#"nexus_requests_total{outcome="rate_limit_exceeded"} 1"#));
        assert!(text.contains("nexus_request_duration_seconds"));
    }

    #[test]
    fn tokens_split_by_direction() {
        let text = with_recorder(|| record_tokens("gpt-4o-mini", 12, 30));
        assert!(text.contains(r#"nexus_tokens_total{model="gpt-4o-mini",type="prompt"} 12"#), "{text}");
        assert!(text.contains(r#"nexus_tokens_total{model="gpt-4o-mini",type="completion"} 30"#));
    }

    #[test]
    fn categories_and_blocks() {
        let text = with_recorder(|| {
            record_pii("EMAIL_ADDRESS");
            record_safety_violation("VIOLENCE");
            record_upstream_blocked();
            record_cost(450);
        });
        assert!(text.contains(r#"nexus_pii_detections_total{category="EMAIL_ADDRESS"} 1"#));
        assert!(text.contains(r#"nexus_safety_violations_total{category="VIOLENCE"} 1"#));
        assert!(text.contains("nexus_upstream_blocked_total 1"));
        assert!(text.contains("nexus_cost_micro_usd_total 450"));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_request("completed", 0.1);
        record_upstream_latency(0.5);
    }
}
