// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the gateway.
//!
//! Every protected route requires `Authorization: Bearer <api key>`. The key
//! is resolved through the user store; on success the [`User`] is placed in
//! the request extensions for handlers to pick up. There are no privilege
//! tiers: any valid key may call any protected route.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use nexus_core::{NexusError, UserStore};
use nexus_core::types::User;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Extracts the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that resolves the bearer key to a user, or rejects with 401.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| NexusError::Auth("missing bearer token".into()))?
        .to_string();

    let user: User = state
        .users
        .lookup(&token)
        .await?
        .ok_or_else(|| NexusError::Auth("invalid or missing API key".into()))?;

    tracing::debug!(user_id = user.user_id.as_str(), "request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_scheme_case_insensitively() {
        assert_eq!(bearer_token(&headers("Bearer nx-abc")), Some("nx-abc"));
        assert_eq!(bearer_token(&headers("bearer nx-abc")), Some("nx-abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
