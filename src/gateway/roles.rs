//! Role CRUD routes. Deletion is blocked while users reference the role;
//! renames cascade through every referencing user.

use super::{require_auth, ApiResponse, AppState};
use crate::error::{ApiError, ApiResult};
use crate::store::{NewRole, Role, RoleUpdate};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;

/// Serialize a role with its live `usersCount`.
fn role_with_count(state: &AppState, role: &Role) -> ApiResult<serde_json::Value> {
    let mut value =
        serde_json::to_value(role).map_err(|e| anyhow::anyhow!("serializing role: {e}"))?;
    value["usersCount"] = json!(state.store.count_users_by_role(&role.name));
    Ok(value)
}

/// GET /api/roles — every role with its user count.
pub(crate) async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let roles = state
        .store
        .roles()
        .iter()
        .map(|role| role_with_count(&state, role))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(json!({ "success": true, "roles": roles })))
}

/// GET /api/roles/{id}
pub(crate) async fn handle_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let role = state
        .store
        .role_by_id(id)
        .ok_or_else(|| ApiError::NotFound("Role not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "role": role_with_count(&state, &role)?,
    })))
}

#[derive(Deserialize)]
pub(crate) struct CreateRoleBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub color: Option<String>,
}

/// POST /api/roles
pub(crate) async fn handle_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateRoleBody>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let name = match body.name.filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => return Err(ApiError::Validation("Role name is required".into())),
    };

    let role = state.store.create_role(NewRole {
        name,
        description: body.description.unwrap_or_default(),
        permissions: body.permissions.unwrap_or_else(|| vec!["read".into()]),
        color: body.color.filter(|c| !c.is_empty()).unwrap_or_else(|| "#64748B".into()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "role": role,
            "message": "Role created successfully",
        })),
    ))
}

#[derive(Deserialize)]
pub(crate) struct UpdateRoleBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub color: Option<String>,
}

/// PUT /api/roles/{id} — renaming rewrites every user holding the old name.
pub(crate) async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    body: Result<Json<UpdateRoleBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let role = state.store.update_role(
        id,
        RoleUpdate {
            name: body.name.filter(|n| !n.is_empty()),
            // An explicit empty description clears the field.
            description: body.description,
            permissions: body.permissions,
            color: body.color.filter(|c| !c.is_empty()),
        },
    )?;

    Ok(Json(json!({
        "success": true,
        "role": role,
        "message": "Role updated successfully",
    })))
}

/// DELETE /api/roles/{id}
pub(crate) async fn handle_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    state.store.delete_role(id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Role deleted successfully",
    })))
}

// ── Tests ───────────────────────────────────────────────────────────
