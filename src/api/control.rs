// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Housekeeping control endpoints polled by the browser

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use super::{ApiError, ApiResult, AppState};
use crate::scenes::SceneId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/toggle", post(toggle))
        .route("/enable", put(enable))
        .route("/scene", get(scene))
        .route("/scene/start/:scene_id", post(start_scene))
        .route("/scene/events", get(events))
        .route("/scenes", get(scenes))
        .route("/sensor", get(sensor_health))
}

fn switched(enabled: bool) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!("Housekeeping {}", if enabled { "enabled" } else { "disabled" }),
        "data": { "enabled": enabled },
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "data": state.engine.status().await }))
}

async fn toggle(State(state): State<AppState>) -> Json<Value> {
    switched(state.engine.toggle().await)
}

async fn enable(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let enabled = payload
        .ok()
        .and_then(|Json(body)| body.get("enabled").and_then(Value::as_bool))
        .ok_or_else(|| ApiError::BadRequest("enabled must be a boolean value".to_string()))?;

    state.engine.set_enabled(enabled).await;
    Ok(switched(enabled))
}

async fn scene(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "config": state.engine.scene_config().await,
            "pending": state.engine.pending_events().await,
        },
    }))
}

async fn start_scene(State(state): State<AppState>, Path(scene_id): Path<String>) -> Json<Value> {
    let id = SceneId::parse_lenient(&scene_id);
    state.engine.set_scene(id).await;

    Json(json!({
        "success": true,
        "message": format!("Scene {} started", scene_id),
        "data": { "scene": id },
    }))
}

async fn events(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "data": state.engine.drain_due_events().await }))
}

async fn scenes(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "data": state.engine.scenes().list() }))
}

async fn sensor_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "data": state.sensors.health().await }))
}
