use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use loyly::{
    api::{self, AppState},
    config::HarviaConfig,
    core::EngineSettings,
    sensors::{HarviaClient, RandomSensor, SensorManager},
    Database, Housekeeping, SceneRegistry,
};

fn state() -> AppState {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let sensors = Arc::new(SensorManager::new(Arc::new(RandomSensor::with_seed(7))));
    let engine = Arc::new(Housekeeping::new(
        sensors.clone(),
        db.clone(),
        SceneRegistry::default(),
        EngineSettings::default(),
    ));

    AppState {
        engine,
        db,
        sensors,
        harvia: HarviaClient::new(&HarviaConfig::default()).unwrap(),
        mock: Arc::new(RandomSensor::with_seed(8)),
    }
}

fn app(state: &AppState) -> Router {
    api::router(state.clone(), Duration::from_secs(60))
}

async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(state, "GET", uri, None).await
}

#[tokio::test]
async fn status_reports_initial_state() {
    let state = state();

    let (status, body) = get(&state, "/api/control/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["scene"], 0);
    assert_eq!(body["data"]["enabled"], true);
    assert_eq!(body["data"]["runCount"], 0);
    assert_eq!(body["data"]["intervalMs"], 10_000);
    assert!(body["data"]["lastRunTime"].is_null());
}

#[tokio::test]
async fn toggle_flips_enabled() {
    let state = state();

    let (status, body) = send(&state, "POST", "/api/control/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);
    assert_eq!(body["message"], "Housekeeping disabled");

    let (_, body) = get(&state, "/api/control/status").await;
    assert_eq!(body["data"]["enabled"], false);
}

#[tokio::test]
async fn enable_requires_boolean() {
    let state = state();

    let (status, body) = send(&state, "PUT", "/api/control/enable", Some(json!({ "enabled": "yes" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "enabled must be a boolean value");

    let (status, _) = send(&state, "PUT", "/api/control/enable", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.engine.is_enabled().await);

    let (status, body) = send(&state, "PUT", "/api/control/enable", Some(json!({ "enabled": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);
    assert!(!state.engine.is_enabled().await);
}

#[tokio::test]
async fn scene_start_parses_leading_integer() {
    let state = state();

    let (status, body) = send(&state, "POST", "/api/control/scene/start/2abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Scene 2abc started");
    assert_eq!(body["data"]["scene"], 2);

    let (_, body) = get(&state, "/api/control/status").await;
    assert_eq!(body["data"]["scene"], 2);

    send(&state, "POST", "/api/control/scene/start/abc", None).await;
    let (_, body) = get(&state, "/api/control/status").await;
    assert!(body["data"]["scene"].is_null());
}

#[tokio::test]
async fn scene_events_are_drained_once() {
    let state = state();
    send(&state, "POST", "/api/control/scene/start/1", None).await;
    state.engine.tick().await;

    let (status, body) = get(&state, "/api/control/scene/events").await;
    assert_eq!(status, StatusCode::OK);
    let events = body["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "START_SCENE");
    assert!(events[0]["run_at"].is_i64());

    let (_, body) = get(&state, "/api/control/scene/events").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // The scheduled win is still queued.
    let (_, body) = get(&state, "/api/control/scene").await;
    assert_eq!(body["data"]["config"]["status"], 1);
    assert_eq!(body["data"]["pending"][0]["event_type"], "SCENE_WIN");
}

#[tokio::test]
async fn scenes_and_sensor_health_are_listed() {
    let state = state();
    state.engine.tick().await;

    let (_, body) = get(&state, "/api/control/scenes").await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["neutral", "loyly-game", "guitar-hero", "outro"]);

    let (_, body) = get(&state, "/api/control/sensor").await;
    assert_eq!(body["data"]["source"], "random");
    assert_eq!(body["data"]["readingsCount"], 1);
}

#[tokio::test]
async fn purchase_with_insufficient_funds_is_rejected() {
    let state = state();
    state.db.create_user("poor", "poor", None, 10).unwrap();

    let (status, body) = send(
        &state,
        "POST",
        "/api/owned-products/purchase",
        Some(json!({ "product_id": 1, "user_id": "poor" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["shortfall"], 10);

    let (_, owned) = get(&state, "/api/owned-products/user/poor").await;
    assert!(owned["data"].as_array().unwrap().is_empty());

    let (_, user) = get(&state, "/api/users/poor").await;
    assert_eq!(user["data"]["money"], 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_purchases_never_overdraw() {
    let state = state();
    state.db.create_user("buyer", "buyer", None, 30).unwrap();
    let order = json!({ "product_id": 1, "user_id": "buyer" });

    let (first, second) = tokio::join!(
        send(&state, "POST", "/api/owned-products/purchase", Some(order.clone())),
        send(&state, "POST", "/api/owned-products/purchase", Some(order)),
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let (_, user) = get(&state, "/api/users/buyer").await;
    assert_eq!(user["data"]["money"], 10);
    let (_, owned) = get(&state, "/api/owned-products/user/buyer").await;
    assert_eq!(owned["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn purchase_and_equip() {
    let state = state();

    let (status, body) = send(
        &state,
        "POST",
        "/api/owned-products/purchase",
        Some(json!({ "product_id": 1, "user_id": "demo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["balance"], 80);
    let owned_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&state, "PUT", &format!("/api/owned-products/{}/toggle-use", owned_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["in_use"], 1);

    let (_, body) = get(&state, "/api/owned-products/user/demo").await;
    assert_eq!(body["data"][0]["in_use"], true);
    assert_eq!(body["data"][0]["product_type"], "vihta");

    let (status, _) = send(&state, "DELETE", &format!("/api/owned-products/{}", owned_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&state, "DELETE", &format!("/api/owned-products/{}", owned_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn purchase_validation() {
    let state = state();

    let (status, body) = send(&state, "POST", "/api/owned-products/purchase", Some(json!({ "user_id": "demo" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "product_id and user_id are required");

    let (status, body) = send(
        &state,
        "POST",
        "/api/owned-products/purchase",
        Some(json!({ "product_id": 999, "user_id": "demo" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = send(&state, "PUT", "/api/owned-products/abc/toggle-use", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn products_and_users() {
    let state = state();

    let (status, body) = get(&state, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"].as_array().unwrap().is_empty());

    let (status, body) = get(&state, "/api/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 20);

    let (status, _) = get(&state, "/api/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&state, "/api/users/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn mock_sensor_batches() {
    let state = state();

    let (status, body) = get(&state, "/api/mockdata/sensor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["type"], "SaunaSensor");

    let (_, body) = get(&state, "/api/mockdata/sensor/batch/abc").await;
    assert_eq!(body["count"], 10);

    let (_, body) = get(&state, "/api/mockdata/sensor/batch/3").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = get(&state, "/api/mockdata/sensor/batch/101").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Maximum batch size is 100");
}

#[tokio::test]
async fn harvia_without_key_fails_cleanly() {
    let state = state();

    let (status, body) = get(&state, "/api/harvia/data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wellness_results() {
    let state = state();

    let (status, _) = get(&state, "/api/wellness/results/s1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    state.db.add_wellness_result("s1", "Calm and well hydrated").unwrap();
    state.db.add_wellness_result("s2", "Stay longer next time").unwrap();

    let (status, body) = get(&state, "/api/wellness/results/s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["result_text"], "Calm and well hydrated");

    let (_, body) = get(&state, "/api/wellness/results?limit=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["session_id"], "s2");
}

#[tokio::test]
async fn hard_coded_wellness_routes_are_not_served() {
    let state = state();

    for uri in [
        "/api/wellness/score/demo",
        "/api/wellness/stats/demo",
        "/api/wellness/activity",
        "/api/wellness/recommendations",
        "/api/wellness/goals",
    ] {
        let (status, body) = get(&state, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["message"], "Route not found", "{uri}");
    }
}

#[tokio::test]
async fn database_reset_and_readings() {
    let state = state();
    state.engine.tick().await;
    state.db.purchase("demo", 1).unwrap();

    let (_, body) = get(&state, "/api/database/readings").await;
    assert_eq!(body["count"], 1);

    let (status, _) = send(&state, "POST", "/api/database/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&state, "/api/users/demo").await;
    assert_eq!(body["data"]["money"], 100);
    let (_, body) = get(&state, "/api/database/readings").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let state = state();

    let (status, body) = get(&state, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Route not found" }));

    let (status, body) = get(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
