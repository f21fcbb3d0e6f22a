// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /chat/completions, GET /metrics, the /admin/users routes,
//! and the unauthenticated GET /, GET /health, GET /metrics/prometheus.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use nexus_core::types::{ChatRequest, HealthStatus, User};
use nexus_core::{NexusError, PluginAdapter, UserStore};
use nexus_pipeline::{ChatResponse, MetricsSnapshot};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /admin/users.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

/// Response body for POST /admin/users. The only place the key is ever shown.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user_id: String,
    pub name: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

/// Response body for GET /admin/users.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

/// Response body for DELETE /admin/users/{id}.
#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub deleted: bool,
    pub user_id: String,
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub message: &'static str,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every component is healthy, "unavailable" otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub components: BTreeMap<&'static str, &'static str>,
}

/// POST /chat/completions
///
/// Runs the request through the pipeline under the configured request timeout.
pub async fn post_chat_completions(
    State(state): State<GatewayState>,
    Extension(user): Extension<User>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    let response = tokio::time::timeout(
        state.request_timeout,
        state.pipeline.process(&user, request),
    )
    .await
    .map_err(|_| NexusError::Timeout {
        duration: state.request_timeout,
    })??;
    Ok(Json(response))
}

/// GET /metrics
///
/// Aggregate usage counters. An unreachable counter store is a 503 here.
pub async fn get_metrics(
    State(state): State<GatewayState>,
) -> Result<Json<MetricsSnapshot>, ApiError> {
    state.metrics.snapshot().await.map(Json).map_err(|e| {
        warn!(error = %e, "metrics unavailable");
        ApiError::from(e).store_unavailable_as(StatusCode::SERVICE_UNAVAILABLE)
    })
}

/// POST /admin/users
pub async fn post_admin_users(
    State(state): State<GatewayState>,
    Extension(admin): Extension<User>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), ApiError> {
    let Json(body) = body?;
    let created = state.users.create(&body.name).await?;
    info!(
        user_id = created.user.user_id.as_str(),
        admin_id = admin.user_id.as_str(),
        "user created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user_id: created.user.user_id,
            name: created.user.name,
            api_key: created.api_key,
            created_at: created.user.created_at,
        }),
    ))
}

/// GET /admin/users
///
/// Newest first. Keys are shown by prefix only.
pub async fn get_admin_users(
    State(state): State<GatewayState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(UserListResponse { users }))
}

/// DELETE /admin/users/{id}
pub async fn delete_admin_user(
    State(state): State<GatewayState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<Json<DeletedUserResponse>, ApiError> {
    if !state.users.delete(&user_id).await? {
        return Err(NexusError::NotFound(format!("user {user_id}")).into());
    }
    info!(
        user_id = user_id.as_str(),
        admin_id = admin.user_id.as_str(),
        "user revoked"
    );
    Ok(Json(DeletedUserResponse {
        deleted: true,
        user_id,
    }))
}

/// GET /
pub async fn get_root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        service: "nexus",
        version: env!("CARGO_PKG_VERSION"),
        message: "Welcome to Nexus AI Gateway! Use Bearer token authentication for API access.",
    })
}

/// GET /health
///
/// Checks the counter store, user store, and upstream adapter. Details of a
/// failing component go to the log, not the response.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let checks = [
        (
            "counter_store",
            state.counters.name().to_string(),
            state.counters.health_check().await,
        ),
        (
            "user_store",
            state.users.name().to_string(),
            state.users.health_check().await,
        ),
        (
            "upstream",
            state.pipeline.upstream().name().to_string(),
            state.pipeline.upstream().health_check().await,
        ),
    ];

    let mut components = BTreeMap::new();
    let mut all_healthy = true;
    for (component, adapter, result) in checks {
        let status = result.unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        let label = match &status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(detail) => {
                warn!(
                    component,
                    adapter = adapter.as_str(),
                    detail = detail.as_str(),
                    "component degraded"
                );
                "degraded"
            }
            HealthStatus::Unhealthy(detail) => {
                warn!(
                    component,
                    adapter = adapter.as_str(),
                    detail = detail.as_str(),
                    "component unhealthy"
                );
                "unhealthy"
            }
        };
        all_healthy &= status.is_healthy();
        components.insert(component, label);
    }

    let (code, status) = if all_healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        components,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics/prometheus
///
/// Prometheus text exposition, or 404 when the recorder is disabled.
pub async fn get_prometheus(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "prometheus exporter disabled").into_response(),
    }
}
