// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound HTTP client construction.

use std::time::Duration;

use nexus_core::NexusError;
use reqwest::header::HeaderMap;
use tracing::error;

/// Build a reqwest client with TLS 1.2 minimum, a request timeout, and default headers.
///
/// Endpoint schemes are checked at config validation time; loopback hosts
/// may use plain HTTP so local mocks and sidecars work.
pub fn build_client(timeout: Duration, headers: HeaderMap) -> Result<reqwest::Client, NexusError> {
    reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| {
            error!("failed to build HTTP client: {e}");
            NexusError::Config(format!("failed to build HTTP client: {e}"))
        })
}

/// Fixed description of a transport failure that never includes the URL.
///
/// reqwest's `Display` names the request URL, and configured endpoints can
/// carry internal hostnames or credentials in the query string.
pub fn transport_failure(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_decode() || e.is_body() {
        "unreadable response body"
    } else {
        "request failed"
    }
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
