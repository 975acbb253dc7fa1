//! Axum-based HTTP gateway with body limits, timeouts, and bearer-token auth.
//!
//! Route groups, one handler module each:
//! - `/api/auth/*` — login, logout, me, verify
//! - `/api/users/*` — CRUD, search/filter/pagination, bulk delete
//! - `/api/roles/*` — CRUD with referential integrity
//! - `/api/settings/*` — key/value upserts
//! - `/api/analytics/*` — read-only aggregations
//!
//! Every response uses the `{"success": ..., ...}` envelope; failures flow
//! through [`ApiError`]'s `IntoResponse` impl.

pub mod analytics;
pub mod auth;
pub mod roles;
pub mod settings;
pub mod users;

use crate::auth::{Claims, TokenIssuer};
use crate::error::{ApiError, ApiResult};
use crate::store::Store;
use anyhow::Result;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion.
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout — admin CRUD has no long-running work.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Concrete return type for created-resource handlers (avoids
/// `impl IntoResponse` inference issues).
pub(crate) type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub tokens: Arc<TokenIssuer>,
}

/// Run the HTTP gateway until the process is stopped.
pub async fn run_gateway(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("UserHub gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the application router. Split out of [`run_gateway`] so tests can
/// drive it without binding a socket.
pub fn router(state: AppState) -> Router {
    // ── CORS — the dashboard front end may be served from anywhere ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/me", get(auth::handle_me))
        .route("/api/auth/verify", get(auth::handle_verify))
        .route("/api/users", get(users::handle_list))
        .route("/api/users", post(users::handle_create))
        .route("/api/users/bulk-delete", post(users::handle_bulk_delete))
        .route("/api/users/{id}", get(users::handle_get))
        .route("/api/users/{id}", put(users::handle_update))
        .route("/api/users/{id}", delete(users::handle_delete))
        .route("/api/roles", get(roles::handle_list))
        .route("/api/roles", post(roles::handle_create))
        .route("/api/roles/{id}", get(roles::handle_get))
        .route("/api/roles/{id}", put(roles::handle_update))
        .route("/api/roles/{id}", delete(roles::handle_delete))
        .route("/api/settings", get(settings::handle_list))
        .route("/api/settings/bulk", post(settings::handle_bulk_update))
        .route("/api/settings/{key}", get(settings::handle_get))
        .route("/api/settings/{key}", put(settings::handle_update))
        .route("/api/analytics/stats", get(analytics::handle_stats))
        .route("/api/analytics/growth", get(analytics::handle_growth))
        .route(
            "/api/analytics/monthly-trends",
            get(analytics::handle_monthly_trends),
        )
        .route(
            "/api/analytics/roles-distribution",
            get(analytics::handle_roles_distribution),
        )
        .route(
            "/api/analytics/status-distribution",
            get(analytics::handle_status_distribution),
        )
        .route(
            "/api/analytics/recent-activity",
            get(analytics::handle_recent_activity),
        )
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// GET /health — always public (no secrets leaked).
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Extract the bearer token from the Authorization header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Access Guard: validate the caller's bearer token and hand back its
/// claims. Stateless — no store lookup, the token is self-contained.
///
/// Missing credential and invalid/expired credential are distinct signals
/// (401 vs 403), but WHICH check failed inside verification is deliberately
/// not exposed.
pub(crate) fn require_auth(state: &AppState, headers: &HeaderMap) -> ApiResult<Claims> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Access token required".into()))?;

    state.tokens.verify(token).map_err(|e| {
        tracing::debug!("token rejected: {e}");
        ApiError::Forbidden("Invalid or expired token".into())
    })
}

// ── Test helpers ────────────────────────────────────────────────────


// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::testutil::{auth_headers, test_state};
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn security_body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn bearer_extraction_requires_the_scheme_prefix() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn guard_rejects_missing_token_as_unauthorized() {
        let (_tmp, state) = test_state();
        let result = require_auth(&state, &HeaderMap::new());
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn guard_rejects_garbage_token_as_forbidden() {
        let (_tmp, state) = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not.a.token"),
        );
        let result = require_auth(&state, &headers);
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn guard_rejects_token_from_another_issuer_as_forbidden() {
        let (_tmp, state) = test_state();
        let other = TokenIssuer::new("some-other-secret", crate::auth::DEFAULT_TOKEN_TTL_SECS);
        let user = state.store.user_by_id(1).unwrap();
        let (token, _) = other.issue(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(matches!(
            require_auth(&state, &headers),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn guard_attaches_claims_for_a_valid_token() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let claims = require_auth(&state, &headers).unwrap();
        assert_eq!(claims.id, 1);
        assert_eq!(claims.email, "admin@userhub.com");
        assert_eq!(claims.role, "Admin");
    }
}
