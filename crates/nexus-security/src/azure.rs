// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Azure AI Content Safety text-analysis screener.
//!
//! Calls `POST {endpoint}/contentsafety/text:analyze` with the eight-level
//! severity output. Texts longer than the service limit are split and the
//! highest severity per category across chunks is kept.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nexus_config::model::ContentSafetyConfig;
use nexus_core::types::{AdapterType, HazardCategory, HealthStatus, SafetyVerdict};
use nexus_core::{NexusError, PluginAdapter, SafetyScreener};

use crate::http::{build_client, join_url, transport_failure};
use crate::secrets::scrub;

/// Service limit on characters per analysis call.
pub const MAX_CHARS_PER_CALL: usize = 10_000;

const ANALYZE_PATH: &str = "contentsafety/text:analyze";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    text: &'a str,
    categories: [&'static str; 4],
    output_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    categories_analysis: Vec<CategoryAnalysis>,
}

#[derive(Debug, Deserialize)]
struct CategoryAnalysis {
    category: String,
    #[serde(default)]
    severity: Option<u8>,
}

fn map_category(name: &str) -> Option<HazardCategory> {
    match name {
        "Hate" => Some(HazardCategory::Hate),
        "SelfHarm" => Some(HazardCategory::SelfHarm),
        "Sexual" => Some(HazardCategory::Sexual),
        "Violence" => Some(HazardCategory::Violence),
        _ => None,
    }
}

/// Split on char boundaries into pieces of at most `max_chars` characters.
fn chunks(text: &str, max_chars: usize) -> Vec<&str> {
    if text.is_empty() {
        return vec![text];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&text[start..]);
    pieces
}

/// Screener backed by the Azure Content Safety REST API.
pub struct AzureContentSafety {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    api_key: SecretString,
    threshold: u8,
    timeout: Duration,
}

impl AzureContentSafety {
    pub fn new(config: &ContentSafetyConfig) -> Result<Self, NexusError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            NexusError::Config("content_safety.endpoint is required for the azure screener".into())
        })?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            NexusError::Config("content_safety.api_key is required for the azure screener".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = build_client(timeout, headers)?;

        Ok(Self {
            client,
            endpoint,
            api_version: config.api_version.clone(),
            api_key: SecretString::from(api_key),
            threshold: config.severity_threshold,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> NexusError {
        let e = e.without_url();
        warn!(error = %e, timeout = ?self.timeout, "content safety request failed");
        NexusError::ScreenerUnavailable {
            message: transport_failure(&e).to_string(),
            status: None,
            source: Some(Box::new(e)),
        }
    }

    async fn analyze(&self, text: &str) -> Result<Vec<CategoryAnalysis>, NexusError> {
        let url = format!(
            "{}?api-version={}",
            join_url(&self.endpoint, ANALYZE_PATH),
            self.api_version
        );
        let body = AnalyzeRequest {
            text,
            categories: ["Hate", "SelfHarm", "Sexual", "Violence"],
            output_type: "EightSeverityLevels",
        };

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, "content safety response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = scrub(&body, &[self.api_key.expose_secret()]);
            warn!(status = %status, body = %body, "content safety call failed");
            return Err(NexusError::ScreenerUnavailable {
                message: format!("service returned {status}"),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let parsed: AnalyzeResponse = response.json().await.map_err(|e| {
            warn!(error = %e.without_url(), "unreadable content safety response");
            NexusError::ScreenerUnavailable {
                message: "unreadable analysis response".into(),
                status: Some(status.as_u16()),
                source: None,
            }
        })?;
        Ok(parsed.categories_analysis)
    }
}

#[async_trait]
impl PluginAdapter for AzureContentSafety {
    fn name(&self) -> &str {
        "azure-content-safety"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SafetyScreener
    }

    async fn health_check(&self) -> Result<HealthStatus, NexusError> {
        Ok(match self.analyze("health check").await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl SafetyScreener for AzureContentSafety {
    async fn screen(&self, text: &str) -> Result<SafetyVerdict, NexusError> {
        let mut severities: BTreeMap<HazardCategory, u8> =
            HazardCategory::ALL.iter().map(|c| (*c, 0)).collect();

        for piece in chunks(text, MAX_CHARS_PER_CALL) {
            for analysis in self.analyze(piece).await? {
                let Some(category) = map_category(&analysis.category) else {
                    debug!(category = %analysis.category, "ignoring unknown category");
                    continue;
                };
                let severity = analysis.severity.unwrap_or(0);
                let entry = severities.entry(category).or_default();
                *entry = (*entry).max(severity);
            }
        }

        Ok(SafetyVerdict::new(severities, self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(endpoint: &str) -> ContentSafetyConfig {
        ContentSafetyConfig {
            provider: nexus_config::model::ScreenerKind::Azure,
            endpoint: Some(endpoint.to_string()),
            api_key: Some("cs-test-key".into()),
            ..ContentSafetyConfig::default()
        }
    }

    fn analysis(hate: u8, self_harm: u8, sexual: u8, violence: u8) -> serde_json::Value {
        serde_json::json!({
            "blocklistsMatch": [],
            "categoriesAnalysis": [
                {"category": "Hate", "severity": hate},
                {"category": "SelfHarm", "severity": self_harm},
                {"category": "Sexual", "severity": sexual},
                {"category": "Violence", "severity": violence}
            ]
        })
    }

    #[tokio::test]
    async fn maps_severities_and_applies_threshold() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contentsafety/text:analyze"))
            .and(query_param("api-version", "2024-09-01"))
            .and(header("Ocp-Apim-Subscription-Key", "cs-test-key"))
            .and(body_partial_json(serde_json::json!({
                "text": "some text",
                "outputType": "EightSeverityLevels"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis(0, 2, 0, 5)))
            .expect(1)
            .mount(&server)
            .await;

        let screener = AzureContentSafety::new(&config(&server.uri())).unwrap();
        let verdict = screener.screen("some text").await.unwrap();
        assert_eq!(verdict.severities[&HazardCategory::Violence], 5);
        assert_eq!(verdict.severities[&HazardCategory::SelfHarm], 2);
        assert_eq!(verdict.violated(), vec![HazardCategory::Violence]);
    }

    #[tokio::test]
    async fn long_text_takes_max_across_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contentsafety/text:analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis(1, 0, 0, 0)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/contentsafety/text:analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis(0, 0, 6, 0)))
            .mount(&server)
            .await;

        let screener = AzureContentSafety::new(&config(&server.uri())).unwrap();
        let text = "a".repeat(MAX_CHARS_PER_CALL + 5);
        let verdict = screener.screen(&text).await.unwrap();
        assert_eq!(verdict.severities[&HazardCategory::Hate], 1);
        assert_eq!(verdict.severities[&HazardCategory::Sexual], 6);
        assert!(verdict.blocked());
    }

    #[tokio::test]
    async fn service_error_surfaces_without_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("bad key cs-test-key"),
            )
            .mount(&server)
            .await;

        let screener = AzureContentSafety::new(&config(&server.uri())).unwrap();
        let err = screener.screen("x").await.unwrap_err();
        assert!(matches!(
            err,
            NexusError::ScreenerUnavailable { status: Some(401), .. }
        ));
        assert_eq!(err.kind(), "screener_unavailable");
        assert!(!err.to_string().contains("cs-test-key"));
    }

    #[tokio::test]
    async fn unreachable_service_error_omits_endpoint() {
        let screener =
            AzureContentSafety::new(&config("http://127.0.0.1:1/internal-safety")).unwrap();
        let err = screener.screen("x").await.unwrap_err();
        assert_eq!(err.kind(), "screener_unavailable");
        let text = err.to_string();
        assert!(!text.contains("127.0.0.1"), "{text}");
        assert!(!text.contains("internal-safety"), "{text}");
        if let NexusError::ScreenerUnavailable {
            source: Some(source),
            ..
        } = &err
        {
            assert!(!source.to_string().contains("internal-safety"));
        }
    }

    #[tokio::test]
    async fn garbled_verdict_is_screener_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let screener = AzureContentSafety::new(&config(&server.uri())).unwrap();
        let err = screener.screen("x").await.unwrap_err();
        assert!(matches!(err, NexusError::ScreenerUnavailable { .. }));
        assert!(!err.to_string().contains(&server.uri()));
    }

    #[test]
    fn missing_endpoint_is_config_error() {
        let mut cfg = config("https://x");
        cfg.endpoint = None;
        assert!(matches!(
            AzureContentSafety::new(&cfg),
            Err(NexusError::Config(_))
        ));
    }

    #[test]
    fn chunks_respect_char_boundaries() {
        let text = "héllo wörld";
        let pieces = chunks(text, 4);
        assert_eq!(pieces, vec!["héll", "o wö", "rld"]);
        assert_eq!(chunks("", 4), vec![""]);
    }
}
