//! Settings routes — key/value pairs with upsert semantics.

use super::{require_auth, AppState};
use crate::error::{ApiError, ApiResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::json;

/// Values arrive as arbitrary JSON from the front end (booleans, numbers);
/// everything is stored as a string.
fn coerce_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// GET /api/settings — the full key→value map.
pub(crate) async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let mut settings = serde_json::Map::new();
    for entry in state.store.settings() {
        settings.insert(entry.key, serde_json::Value::String(entry.value));
    }

    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// GET /api/settings/{key}
pub(crate) async fn handle_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let setting = state
        .store
        .setting(&key)
        .ok_or_else(|| ApiError::NotFound("Setting not found".into()))?;

    Ok(Json(json!({ "success": true, "setting": setting })))
}

#[derive(Deserialize)]
pub(crate) struct UpdateSettingBody {
    pub value: Option<serde_json::Value>,
}

/// PUT /api/settings/{key} — upsert a single value.
pub(crate) async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    body: Result<Json<UpdateSettingBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("Invalid request: {e}")))?;

    let value = body
        .value
        .and_then(coerce_value)
        .ok_or_else(|| ApiError::Validation("Value is required".into()))?;

    state.store.set_setting(&key, &value)?;

    Ok(Json(json!({
        "success": true,
        "message": "Setting updated successfully",
    })))
}

/// POST /api/settings/bulk — upsert every pair in the posted object.
pub(crate) async fn handle_bulk_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Map<String, serde_json::Value>>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    require_auth(&state, &headers)?;

    let Json(entries) =
        body.map_err(|_| ApiError::Validation("Settings object is required".into()))?;

    for (key, value) in entries {
        if let Some(value) = coerce_value(value) {
            state.store.set_setting(&key, &value)?;
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "Settings updated successfully",
    })))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testutil::{auth_headers, test_state};

    #[tokio::test]
    async fn list_returns_the_seeded_map() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let Json(body) = handle_list(State(state), headers).await.unwrap();
        assert_eq!(body["settings"]["appName"], "UserHub Dashboard");
        assert_eq!(body["settings"]["theme"], "light");
        assert_eq!(body["settings"].as_object().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn get_unknown_key_is_not_found() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let result = handle_get(State(state), headers, Path("nope".into())).await;
        match result {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Setting not found"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_overwrites_and_missing_value_is_rejected() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        handle_update(
            State(state.clone()),
            headers.clone(),
            Path("theme".into()),
            Ok(Json(UpdateSettingBody {
                value: Some(json!("dark")),
            })),
        )
        .await
        .unwrap();
        assert_eq!(state.store.setting("theme").unwrap().value, "dark");

        let result = handle_update(
            State(state),
            headers,
            Path("theme".into()),
            Ok(Json(UpdateSettingBody { value: None })),
        )
        .await;
        match result {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Value is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_coerces_non_string_values() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        handle_update(
            State(state.clone()),
            headers,
            Path("emailNotifications".into()),
            Ok(Json(UpdateSettingBody {
                value: Some(json!(false)),
            })),
        )
        .await
        .unwrap();

        assert_eq!(state.store.setting("emailNotifications").unwrap().value, "false");
    }

    #[tokio::test]
    async fn bulk_upserts_existing_and_new_keys() {
        let (_tmp, state) = test_state();
        let headers = auth_headers(&state, 1);

        let mut entries = serde_json::Map::new();
        entries.insert("theme".into(), json!("dark"));
        entries.insert("maintenanceMode".into(), json!(true));

        let Json(body) = handle_bulk_update(State(state.clone()), headers, Ok(Json(entries)))
            .await
            .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(state.store.setting("theme").unwrap().value, "dark");
        assert_eq!(state.store.setting("maintenanceMode").unwrap().value, "true");
    }
}
