//! User CRUD routes: list (search/filter/pagination), get, create, update,
//! delete, bulk delete.
//!
//! Outbound records always pass through [`UserView`] — the password digest
//! never leaves the store.

use super::{require_auth, ApiResponse, AppState};
use crate::auth::password;
use crate::error::{ApiError, ApiResult};
use crate::store::{NewUser, UserStatus, UserUpdate, UserView};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use chrono::Utc;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde_json::json;

/// Palette for freshly created accounts.
const AVATAR_COLORS: [&str; 7] = [
    "#3B82F6", "#8B5CF6", "#22C55E", "#F59E0B", "#EF4444", "#EC4899", "#06B6D4",
];

fn random_avatar() -> String {
    AVATAR_COLORS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("#64748B")
        .to_string()
}

/// Hash a plaintext password off the async path.
async fn hash_blocking(plaintext: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|e| anyhow::anyhow!("password hash task failed: {e}"))?
}

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// GET /api/users — search, filter, paginate.
pub(crate) async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let page = query.page.unwrap_or(1).max(1) as usize;
    let limit = query.limit.unwrap_or(10).max(1) as usize;

    let mut users = state.store.users();

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        users.retain(|u| {
            u.first_name.to_lowercase().contains(&needle)
                || u.last_name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
        });
    }
    if let Some(role) = query.role.as_deref().filter(|s| !s.is_empty()) {
        users.retain(|u| u.role == role);
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        users.retain(|u| u.status.as_str() == status);
    }

    let total = users.len();
    let total_pages = total.div_ceil(limit);
    let views: Vec<UserView> = users
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .map(UserView::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "users": views,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages,
        },
    })))
}

/// GET /api/users/{id}
pub(crate) async fn handle_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let user = state
        .store
        .user_by_id(id)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(json!({ "success": true, "user": UserView::from(&user) })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateUserBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
}

/// POST /api/users — create an account. Password is optional; an account
/// without one can never log in by credential.
pub(crate) async fn handle_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let (first_name, last_name, email) = match (body.first_name, body.last_name, body.email) {
        (Some(f), Some(l), Some(e)) if !f.is_empty() && !l.is_empty() && !e.is_empty() => {
            (f, l, e)
        }
        _ => {
            return Err(ApiError::Validation(
                "First name, last name, and email are required".into(),
            ))
        }
    };

    // Check before paying for a hash; the store re-checks under its lock.
    if state.store.user_by_email(&email).is_some() {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let digest = match body.password.filter(|p| !p.is_empty()) {
        Some(plaintext) => Some(hash_blocking(plaintext).await?),
        None => None,
    };

    let user = state.store.create_user(NewUser {
        first_name,
        last_name,
        email,
        password: digest,
        role: body.role.filter(|r| !r.is_empty()).unwrap_or_else(|| "User".into()),
        status: body.status.unwrap_or(UserStatus::Pending),
        joined: Utc::now().date_naive(),
        avatar: random_avatar(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserView::from(&user),
            "message": "User created successfully",
        })),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateUserBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
}

/// PUT /api/users/{id} — partial-field update.
pub(crate) async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    body: Result<Json<UpdateUserBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    if state.store.user_by_id(id).is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let digest = match body.password.filter(|p| !p.is_empty()) {
        Some(plaintext) => Some(hash_blocking(plaintext).await?),
        None => None,
    };

    let user = state.store.update_user(
        id,
        UserUpdate {
            first_name: body.first_name.filter(|v| !v.is_empty()),
            last_name: body.last_name.filter(|v| !v.is_empty()),
            email: body.email.filter(|v| !v.is_empty()),
            password: digest,
            role: body.role.filter(|v| !v.is_empty()),
            status: body.status,
        },
    )?;

    Ok(Json(json!({
        "success": true,
        "user": UserView::from(&user),
        "message": "User updated successfully",
    })))
}

/// DELETE /api/users/{id} — callers cannot delete themselves.
pub(crate) async fn handle_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = require_auth(&state, &headers)?;

    if state.store.user_by_id(id).is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }
    if id == claims.id {
        return Err(ApiError::Validation("Cannot delete your own account".into()));
    }

    state.store.delete_user(id)?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

#[derive(Deserialize)]
pub(crate) struct BulkDeleteBody {
    pub ids: Option<Vec<u64>>,
}

/// POST /api/users/bulk-delete — the caller's own id is silently skipped.
pub(crate) async fn handle_bulk_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BulkDeleteBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let claims = require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let ids = match body.ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Err(ApiError::Validation("No user IDs provided".into())),
    };

    let mut deleted_count = 0usize;
    for id in ids.into_iter().filter(|id| *id != claims.id) {
        if state.store.delete_user(id)? {
            deleted_count += 1;
        }
    }

    Ok(Json(json!({
        "success": true,
        "deletedCount": deleted_count,
        "message": format!("{deleted_count} users deleted"),
    })))
}

// ── Tests ───────────────────────────────────────────────────────────
