//! Sensor feeds: the mock sensor and the Harvia cloud passthrough

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::{ApiError, ApiResult, AppState};
use crate::scenes::leading_integer;
use crate::sensors::SensorEnvelope;

pub const MAX_BATCH: i64 = 100;
const DEFAULT_BATCH: i64 = 10;

pub fn mockdata_routes() -> Router<AppState> {
    Router::new()
        .route("/sensor", get(mock_sensor))
        .route("/sensor/batch/:count", get(mock_batch))
}

pub fn harvia_routes() -> Router<AppState> {
    Router::new().route("/data", get(harvia_data))
}

/// Leading integer of `raw`; missing or zero means the default batch size
fn batch_size(raw: &str) -> i64 {
    match leading_integer(raw) {
        Some(0) | None => DEFAULT_BATCH,
        Some(n) => n,
    }
}

async fn mock_sensor(State(state): State<AppState>) -> Json<SensorEnvelope> {
    Json(SensorEnvelope::ok(state.mock.reading_at(Utc::now())))
}

async fn mock_batch(State(state): State<AppState>, Path(count): Path<String>) -> ApiResult<Json<Value>> {
    let count = batch_size(&count);
    if count > MAX_BATCH {
        return Err(ApiError::BadRequest(format!("Maximum batch size is {}", MAX_BATCH)));
    }

    let readings = state.mock.batch_at(count.max(0) as usize, Utc::now());
    Ok(Json(json!({ "success": true, "count": readings.len(), "data": readings })))
}

async fn harvia_data(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let data = state
        .harvia
        .latest_data()
        .await
        .map_err(ApiError::internal("Failed to get sauna status"))?;

    Ok(Json(json!({ "success": true, "data": data })))
}
