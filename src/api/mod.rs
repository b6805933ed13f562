// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! HTTP API
//!
//! Every JSON body follows `{success, message?, data?}`. Route groups:
//!
//! | Prefix                | Purpose                                   |
//! |-----------------------|-------------------------------------------|
//! | `/api/control`        | housekeeping status, enable, scenes, events |
//! | `/api/products`       | shop catalogue                            |
//! | `/api/users`          | user balance lookup                       |
//! | `/api/owned-products` | purchases and equipped items              |
//! | `/api/mockdata`       | simulated sensor readings                 |
//! | `/api/harvia`         | Harvia cloud passthrough                  |
//! | `/api/database`       | reset and sensor log inspection           |
//! | `/api/wellness`       | stored wellness assessments               |

mod control;
mod error;
mod feeds;
mod store;

pub use error::{ApiError, ApiResult};
pub use feeds::MAX_BATCH;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::Housekeeping;
use crate::db::Database;
use crate::sensors::{HarviaClient, RandomSensor, SensorManager};

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Housekeeping>,
    pub db: Arc<Database>,
    pub sensors: Arc<SensorManager>,
    pub harvia: HarviaClient,
    pub mock: Arc<RandomSensor>,
}

/// Build the full router with CORS and request tracing
pub fn router(state: AppState, cors_max_age: Duration) -> Router {
    let cors = CorsLayer::permissive().max_age(cors_max_age);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api/control", control::routes())
        .nest("/api/products", store::product_routes())
        .nest("/api/users", store::user_routes())
        .nest("/api/owned-products", store::owned_routes())
        .nest("/api/database", store::database_routes())
        .nest("/api/wellness", store::wellness_routes())
        .nest("/api/mockdata", feeds::mockdata_routes())
        .nest("/api/harvia", feeds::harvia_routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, Duration::from_secs(config.cors_max_age_secs));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Welcome to the löyly API",
        "version": crate::VERSION,
        "endpoints": {
            "health": "/health",
            "housekeepingControl": "/api/control",
            "products": "/api/products",
            "users": "/api/users/:user_id",
            "ownedProducts": "/api/owned-products",
            "mockData": "/api/mockdata/sensor",
            "harviaSauna": "/api/harvia",
            "databaseReset": "/api/database/reset",
            "wellness": "/api/wellness/results",
        },
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}
