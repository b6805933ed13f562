//! Shop, user, wellness and maintenance endpoints backed by the database

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiResult, AppState};

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

impl LimitQuery {
    fn get(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500)
    }
}

#[derive(Debug, Deserialize)]
struct PurchaseRequest {
    product_id: Option<i64>,
    user_id: Option<String>,
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/:user_id", get(get_user))
}

pub fn owned_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase", post(purchase))
        .route("/user/:user_id", get(owned_by_user))
        .route("/:id/toggle-use", put(toggle_in_use))
        .route("/:id", delete(remove_owned))
}

pub fn database_routes() -> Router<AppState> {
    Router::new()
        .route("/reset", post(reset))
        .route("/readings", get(recent_readings))
}

pub fn wellness_routes() -> Router<AppState> {
    Router::new()
        .route("/results", get(wellness_results))
        .route("/results/:session_id", get(wellness_for_session))
}

// Non-numeric ids can never match a row.
fn row_id(raw: &str, missing: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound(missing.to_string()))
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let products = state
        .db
        .list_products()
        .map_err(ApiError::internal("Error fetching products"))?;

    Ok(Json(json!({ "success": true, "data": products })))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = row_id(&id, "Product not found")?;
    let product = state
        .db
        .product(id)
        .map_err(ApiError::internal("Error fetching product"))?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": product })))
}

async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Value>> {
    let user = state
        .db
        .user(&user_id)
        .map_err(ApiError::internal("Error fetching user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": user })))
}

async fn purchase(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let (Some(product_id), Some(user_id)) = (request.product_id, request.user_id.filter(|u| !u.is_empty())) else {
        return Err(ApiError::BadRequest("product_id and user_id are required".to_string()));
    };

    // The purchase transaction holds the connection lock; keep it off the async workers.
    let db = state.db.clone();
    let purchase = tokio::task::spawn_blocking(move || db.purchase(&user_id, product_id))
        .await
        .map_err(ApiError::internal("Error purchasing product"))??;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product purchased successfully",
            "data": purchase,
        })),
    ))
}

async fn owned_by_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Value>> {
    let owned = state
        .db
        .owned_by_user(&user_id)
        .map_err(ApiError::internal("Error fetching owned products"))?;

    Ok(Json(json!({ "success": true, "data": owned })))
}

async fn toggle_in_use(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = row_id(&id, "Owned product not found")?;
    let in_use = state.db.toggle_in_use(id)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Product marked as {}", if in_use { "in use" } else { "not in use" }),
        "data": { "id": id, "in_use": i64::from(in_use) },
    })))
}

async fn remove_owned(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = row_id(&id, "Owned product not found")?;
    state.db.remove_owned(id)?;

    Ok(Json(json!({ "success": true, "message": "Owned product removed successfully" })))
}

async fn reset(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || db.reset())
        .await
        .map_err(ApiError::internal("Failed to reinitialize database"))?
        .map_err(ApiError::internal("Failed to reinitialize database"))?;

    Ok(Json(json!({ "success": true, "message": "Database reinitialized successfully" })))
}

async fn recent_readings(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let readings = state
        .db
        .recent_readings(query.get())
        .map_err(ApiError::internal("Error fetching sensor logs"))?;

    Ok(Json(json!({ "success": true, "count": readings.len(), "data": readings })))
}

async fn wellness_results(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Value>> {
    let results = state
        .db
        .wellness_results(query.get())
        .map_err(ApiError::internal("Error fetching wellness results"))?;

    Ok(Json(json!({ "success": true, "data": results })))
}

async fn wellness_for_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let results = state
        .db
        .wellness_for_session(&session_id)
        .map_err(ApiError::internal("Error fetching wellness results"))?;

    if results.is_empty() {
        return Err(ApiError::NotFound("No wellness results for this session".to_string()));
    }

    Ok(Json(json!({ "success": true, "data": results })))
}
