use crate::api::{ApiError, AppState};
use crate::core::service::AddMonitorRequest;
use crate::core::Monitor;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct UidParams {
    pub uid: Option<String>,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "SitePulse Backend is running!"
    }))
}

pub async fn add_monitor(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddMonitorRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let service = state.service()?;
    let Json(request) = payload.map_err(ApiError::invalid_body)?;

    let monitor = service
        .add_monitor(request)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to add monitor."))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Monitor added successfully!",
            "id": monitor.id
        })),
    ))
}

/// `uid` comes from the JSON body; `?uid=` is accepted when the body is empty.
pub async fn delete_monitor(
    State(state): State<AppState>,
    Path(monitor_id): Path<String>,
    Query(params): Query<UidParams>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let service = state.service()?;

    let uid = if body.iter().all(u8::is_ascii_whitespace) {
        params.uid
    } else {
        let parsed: UidParams = serde_json::from_slice(&body).map_err(ApiError::invalid_body)?;
        parsed.uid
    };

    service
        .delete_monitor(uid.as_deref(), &monitor_id)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to delete monitor."))?;

    Ok(Json(json!({ "message": "Monitor deleted successfully." })))
}

pub async fn list_monitors(
    State(state): State<AppState>,
    Query(params): Query<UidParams>,
) -> ApiResult<Json<Value>> {
    let service = state.service()?;

    let monitors = service
        .list_monitors(params.uid.as_deref())
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to list monitors."))?;

    Ok(Json(json!({ "monitors": monitors })))
}

pub async fn get_monitor(
    State(state): State<AppState>,
    Path(monitor_id): Path<String>,
    Query(params): Query<UidParams>,
) -> ApiResult<Json<Monitor>> {
    let service = state.service()?;

    let monitor = service
        .get_monitor(params.uid.as_deref(), &monitor_id)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to load monitor."))?;

    Ok(Json(monitor))
}
