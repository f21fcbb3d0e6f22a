// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use nexus_config::model::ServerConfig;
use nexus_core::{CounterStore, NexusError, UserStore};
use nexus_pipeline::{MetricsStore, Pipeline};

use crate::auth::auth_middleware;
use crate::handlers;

/// State for the unauthenticated health and exposition endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    /// Usage counters read by `GET /metrics`.
    pub metrics: MetricsStore,
    pub users: Arc<dyn UserStore>,
    /// Checked by `GET /health`.
    pub counters: Arc<dyn CounterStore>,
    /// Upper bound on one chat request, upstream call included.
    pub request_timeout: Duration,
    pub health: HealthState,
}

/// Builds the full route table.
///
/// - GET / , GET /health, GET /metrics, GET /metrics/prometheus (no auth)
/// - POST /chat/completions (with auth)
/// - POST|GET /admin/users, DELETE /admin/users/{id} (with auth)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/metrics/prometheus", get(handlers::get_prometheus))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/chat/completions", post(handlers::post_chat_completions))
        .route(
            "/admin/users",
            post(handlers::post_admin_users).get(handlers::get_admin_users),
        )
        .route("/admin/users/{user_id}", delete(handlers::delete_admin_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until `shutdown` is cancelled.
///
/// In-flight requests are allowed to complete before this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), NexusError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NexusError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| NexusError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use nexus_core::types::HazardCategory;
    use nexus_test_utils::{RecordingScreener, TestHarness, UnavailableCounterStore};

    use super::*;

    fn state(harness: &TestHarness) -> GatewayState {
        GatewayState {
            pipeline: harness.pipeline.clone(),
            metrics: harness.pipeline.metrics().clone(),
            users: harness.users.clone(),
            counters: harness.counters.clone(),
            request_timeout: Duration::from_secs(5),
            health: HealthState::new(None),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn chat(key: &str, body: serde_json::Value) -> Request<Body> {
        Request::post("/chat/completions")
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_is_public() {
        let harness = TestHarness::builder().build().await.unwrap();
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, json) = send(router(state(&harness)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "nexus");
    }

    #[tokio::test]
    async fn chat_requires_a_known_key() {
        let harness = TestHarness::builder().build().await.unwrap();
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}],
            "model": "test-model"
        });

        let (status, json) =
            send(router(state(&harness)), chat("nx-not-a-key", body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["kind"], "auth_error");

        let missing = Request::post("/chat/completions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(router(state(&harness)), missing).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(harness.upstream.calls(), 0);
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let harness = TestHarness::builder().build().await.unwrap();
        let key = harness.create_user("alice").await.unwrap().api_key;
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": "hello"}],
            "model": "test-model",
            "max_tokens": 50
        });

        let (status, json) = send(router(state(&harness)), chat(&key, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["upstream_response"]["content"], "mock response");
        assert_eq!(json["rate_limit_info"]["tokens_limit"], 1000);
        assert!(json["estimated_prompt_tokens"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let harness = TestHarness::builder().build().await.unwrap();
        let key = harness.create_user("alice").await.unwrap().api_key;
        let body = serde_json::json!({
            "messages": [{"role": "wizard", "content": "x"}],
            "model": "m"
        });

        let (status, json) = send(router(state(&harness)), chat(&key, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn content_violation_is_400_with_categories() {
        let harness = TestHarness::builder()
            .with_screener(
                RecordingScreener::new(4).with_trigger("siege", HazardCategory::Violence, 6),
            )
            .build()
            .await
            .unwrap();
        let key = harness.create_user("alice").await.unwrap().api_key;
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": "siege"}],
            "model": "test-model"
        });

        let (status, json) = send(router(state(&harness)), chat(&key, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["kind"], "content_policy_violation");
        assert_eq!(json["error"]["categories"], serde_json::json!(["VIOLENCE"]));
    }

    #[tokio::test]
    async fn admin_user_lifecycle() {
        let harness = TestHarness::builder().build().await.unwrap();
        let admin_key = harness.create_user("admin").await.unwrap().api_key;
        let app = router(state(&harness));

        let create = Request::post("/admin/users")
            .header(header::AUTHORIZATION, format!("Bearer {admin_key}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"bob"}"#))
            .unwrap();
        let (status, created) = send(app.clone(), create).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["api_key"].as_str().unwrap().starts_with("nx-"));
        let bob_id = created["user_id"].as_str().unwrap().to_string();

        let list = Request::get("/admin/users")
            .header(header::AUTHORIZATION, format!("Bearer {admin_key}"))
            .body(Body::empty())
            .unwrap();
        let (status, listed) = send(app.clone(), list).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["users"][0]["name"], "bob");
        assert!(listed["users"][0].get("api_key").is_none());

        let revoke = |id: &str| {
            Request::delete(format!("/admin/users/{id}"))
                .header(header::AUTHORIZATION, format!("Bearer {admin_key}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, deleted) = send(app.clone(), revoke(&bob_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["deleted"], true);

        let (status, json) = send(app, revoke(&bob_id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn blank_user_name_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let admin_key = harness.create_user("admin").await.unwrap().api_key;
        let create = Request::post("/admin/users")
            .header(header::AUTHORIZATION, format!("Bearer {admin_key}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"   "}"#))
            .unwrap();
        let (status, _) = send(router(state(&harness)), create).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_and_health_report_store_outage() {
        let harness = TestHarness::builder()
            .with_counter_store(Arc::new(UnavailableCounterStore))
            .build()
            .await
            .unwrap();
        let app = router(state(&harness));

        let metrics = Request::get("/metrics").body(Body::empty()).unwrap();
        let (status, json) = send(app.clone(), metrics).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["kind"], "backing_store_unavailable");
        assert!(!json.to_string().contains("6379"));

        let health = Request::get("/health").body(Body::empty()).unwrap();
        let (status, json) = send(app, health).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["components"]["counter_store"], "unhealthy");
        assert_eq!(json["components"]["user_store"], "healthy");
    }

    #[tokio::test]
    async fn chat_fails_closed_when_store_is_down() {
        let harness = TestHarness::builder()
            .with_counter_store(Arc::new(UnavailableCounterStore))
            .build()
            .await
            .unwrap();
        let key = harness.create_user("alice").await.unwrap().api_key;
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": "hello"}],
            "model": "test-model"
        });

        let (status, json) = send(router(state(&harness)), chat(&key, body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "service temporarily unavailable");
        assert_eq!(harness.upstream.calls(), 0);
    }

    #[tokio::test]
    async fn prometheus_is_404_when_disabled() {
        let harness = TestHarness::builder().build().await.unwrap();
        let response = router(state(&harness))
            .oneshot(Request::get("/metrics/prometheus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
