//! Authentication routes: login, logout, current user, token check.

use super::{extract_bearer_token, require_auth, AppState};
use crate::auth::password;
use crate::error::{ApiError, ApiResult};
use crate::store::User;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

/// Request body for login. Fields are optional so a missing field produces
/// the validation message instead of a deserialization error.
#[derive(Deserialize)]
pub(crate) struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The reduced user object returned by auth endpoints.
fn user_summary(user: &User) -> serde_json::Value {
    json!({
        "id": user.id,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "email": user.email,
        "role": user.role,
        "avatar": user.avatar,
    })
}

/// POST /api/auth/login — verify credentials, issue a token, record the
/// session. Unknown email, credential-less account, and wrong password all
/// produce the same response.
pub(crate) async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let (email, plaintext) = match (body.email, body.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".into(),
            ))
        }
    };

    let invalid = || ApiError::Unauthorized("Invalid email or password".into());

    let user = state.store.user_by_email(&email).ok_or_else(invalid)?;

    // No local credential on record — never reaches the verifier.
    let digest = user.password.clone().ok_or_else(invalid)?;

    // argon2 verification is deliberately slow; keep it off the async path.
    let verified = tokio::task::spawn_blocking(move || password::verify(&plaintext, &digest))
        .await
        .map_err(|e| anyhow::anyhow!("password verify task failed: {e}"))?;
    if !verified {
        return Err(invalid());
    }

    let (token, claims) = state.tokens.issue(&user)?;
    let created_at = DateTime::<Utc>::from_timestamp(claims.iat, 0).unwrap_or_else(Utc::now);
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
    state
        .store
        .create_session(user.id, &token, created_at, expires_at)?;

    tracing::info!(user = user.id, "login succeeded");
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user_summary(&user),
    })))
}

/// POST /api/auth/logout — delete the caller's session row. The signed
/// token stays valid until its embedded expiry.
pub(crate) async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    if let Some(token) = extract_bearer_token(&headers) {
        state.store.delete_session(token)?;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}

/// GET /api/auth/me — the caller's current user record.
pub(crate) async fn handle_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = require_auth(&state, &headers)?;

    let user = state
        .store
        .user_by_id(claims.id)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "user": user_summary(&user),
    })))
}

/// GET /api/auth/verify — cheap token check for the front end.
pub(crate) async fn handle_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;
    Ok(Json(json!({ "success": true, "valid": true })))
}

// ── Tests ───────────────────────────────────────────────────────────
