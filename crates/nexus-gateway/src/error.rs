// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`NexusError`] onto HTTP responses.
//!
//! Every error body has the shape `{"error": {"kind", "message"}}`. Rate
//! limit errors add the numeric window state and content policy errors add
//! the violated categories. Infrastructure errors are logged in full and
//! answered with a generic message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use nexus_core::NexusError;
use nexus_core::types::HazardCategory;

/// An error on its way out to a client.
#[derive(Debug)]
pub struct ApiError {
    inner: NexusError,
    store_unavailable_status: StatusCode,
}

impl ApiError {
    /// Status used for [`NexusError::BackingStoreUnavailable`] on this route.
    pub fn store_unavailable_as(mut self, status: StatusCode) -> Self {
        self.store_unavailable_status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        match &self.inner {
            NexusError::Validation(_)
            | NexusError::UnsupportedModel { .. }
            | NexusError::ContentPolicyViolation { .. }
            | NexusError::UpstreamPolicyBlock { .. } => StatusCode::BAD_REQUEST,
            NexusError::Auth(_) => StatusCode::UNAUTHORIZED,
            NexusError::NotFound(_) => StatusCode::NOT_FOUND,
            NexusError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            NexusError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            NexusError::ScreenerUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            NexusError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            NexusError::BackingStoreUnavailable { .. } => self.store_unavailable_status,
            NexusError::Storage { .. } | NexusError::Config(_) | NexusError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        if self.inner.is_client_safe() {
            return self.inner.to_string();
        }
        match &self.inner {
            NexusError::BackingStoreUnavailable { .. } => "service temporarily unavailable",
            NexusError::Storage { .. } => "user store failure",
            _ => "internal server error",
        }
        .to_string()
    }
}

impl From<NexusError> for ApiError {
    fn from(inner: NexusError) -> Self {
        Self {
            inner,
            store_unavailable_status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body rejections never echo the payload back, since it may hold PII.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "request body does not match the expected schema",
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => {
                "expected request with `Content-Type: application/json`"
            }
            _ => "failed to read request body",
        };
        NexusError::Validation(message.to_string()).into()
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit: Option<RateLimitDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<HazardCategory>>,
}

#[derive(Debug, Serialize)]
struct RateLimitDetail {
    used: u64,
    requested: u64,
    limit: u64,
    remaining: u64,
    reset_in_seconds: u64,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !self.inner.is_client_safe() {
            error!(kind = self.inner.kind(), error = %self.inner, "request failed");
        }

        let rate_limit = match &self.inner {
            NexusError::RateLimitExceeded {
                used,
                requested,
                limit,
                remaining,
                reset_in_seconds,
            } => Some(RateLimitDetail {
                used: *used,
                requested: *requested,
                limit: *limit,
                remaining: *remaining,
                reset_in_seconds: *reset_in_seconds,
            }),
            _ => None,
        };
        let categories = match &self.inner {
            NexusError::ContentPolicyViolation { categories } => Some(categories.clone()),
            _ => None,
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: self.inner.kind(),
                message: self.client_message(),
                rate_limit,
                categories,
            },
        };

        let mut response = (status, Json(body)).into_response();
        match &self.inner {
            NexusError::Auth(_) => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            NexusError::RateLimitExceeded {
                reset_in_seconds, ..
            } => {
                if let Ok(value) = HeaderValue::from_str(&reset_in_seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            _ => {}
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rate_limit_body_carries_window_state() {
        let err = ApiError::from(NexusError::RateLimitExceeded {
            used: 999,
            requested: 5,
            limit: 1000,
            remaining: 1,
            reset_in_seconds: 1200,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1200");

        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "rate_limit_exceeded");
        assert_eq!(json["error"]["rate_limit"]["remaining"], 1);
        assert_eq!(json["error"]["rate_limit"]["reset_in_seconds"], 1200);
    }

    #[tokio::test]
    async fn content_violation_lists_categories() {
        let err = ApiError::from(NexusError::ContentPolicyViolation {
            categories: vec![HazardCategory::Violence],
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["categories"], serde_json::json!(["VIOLENCE"]));
    }

    #[tokio::test]
    async fn store_failure_is_generic() {
        let err = ApiError::from(NexusError::backing_store(std::io::Error::other(
            "redis at 10.0.0.7:6379 refused",
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "backing_store_unavailable");
        assert!(!json.to_string().contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn screener_outage_is_distinct_from_upstream_failure() {
        let response = ApiError::from(NexusError::ScreenerUnavailable {
            message: "service returned 500 Internal Server Error".into(),
            status: Some(500),
            source: None,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "screener_unavailable");
    }

    #[test]
    fn store_failure_status_is_per_route() {
        let err = ApiError::from(NexusError::backing_store(std::io::Error::other("down")))
            .store_unavailable_as(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let response = ApiError::from(NexusError::Auth("invalid API key".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
