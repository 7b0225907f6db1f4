#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use paranoia_api::config::ServerConfig;
use paranoia_api::router::build_app_router;
use paranoia_api::state::AppState;
use paranoia_core::entity::{Entity, EntityType, Metric};
use paranoia_core::store::memory::MemoryEntityStore;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. No database is configured; tests run
/// against the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        merge_max_attempts: 5,
        database_url: String::new(),
        database_max_connections: 1,
    }
}

/// Build the full application router over `store`, with the same middleware
/// stack production uses.
pub fn build_test_app(store: Arc<MemoryEntityStore>) -> Router {
    let config = test_config();
    let state = AppState::new(store, config.clone());
    build_app_router(state, &config)
}

/// A store with the given `(identifier, type)` entities provisioned empty.
pub fn store_with(entities: &[(&str, EntityType)]) -> Arc<MemoryEntityStore> {
    let store = MemoryEntityStore::new();
    for (identifier, entity_type) in entities {
        store
            .provision(Entity {
                identifier: identifier.to_string(),
                entity_type: *entity_type,
                metrics: Vec::<Metric>::new(),
            })
            .expect("provision entity");
    }
    Arc::new(store)
}

/// A complete six-field update body.
pub fn update_body(entity: &str, source: &str, metric: &str, value: &str) -> serde_json::Value {
    serde_json::json!({
        "entity": entity,
        "type": "host",
        "source": source,
        "metric": metric,
        "value": value,
        "timestamp": "2026-01-01T12:00:00Z",
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
