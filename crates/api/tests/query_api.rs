//! HTTP-level tests for the entity read endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, store_with, update_body};
use paranoia_core::entity::EntityType;

fn seeded() -> std::sync::Arc<paranoia_core::store::memory::MemoryEntityStore> {
    store_with(&[
        ("10.0.0.2", EntityType::Host),
        ("10.0.0.1", EntityType::Host),
        ("example.com", EntityType::Website),
    ])
}

#[tokio::test]
async fn list_without_filter_returns_sorted_identifiers() {
    let response = get(common::build_test_app(seeded()), "/api/v1/entities").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        serde_json::json!(["10.0.0.1", "10.0.0.2", "example.com"])
    );
}

#[tokio::test]
async fn website_filters_are_equivalent() {
    let store = seeded();
    let mut results = Vec::new();
    for uri in [
        "/api/v1/entities?type=Website",
        "/api/v1/entities?type=web",
        "/api/v1/entities?type=%20WEB%20",
    ] {
        let response = get(common::build_test_app(store.clone()), uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        results.push(body_json(response).await["data"].clone());
    }

    assert_eq!(results[0], serde_json::json!(["example.com"]));
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[tokio::test]
async fn plural_and_padded_host_filter_matches_host() {
    let store = seeded();
    let plural = get(common::build_test_app(store.clone()), "/api/v1/entities?type=hosts%20").await;
    let singular = get(common::build_test_app(store), "/api/v1/entities?type=host").await;

    let plural = body_json(plural).await;
    assert_eq!(plural, body_json(singular).await);
    assert_eq!(plural["data"], serde_json::json!(["10.0.0.1", "10.0.0.2"]));
}

#[tokio::test]
async fn empty_listing_is_404() {
    let response = get(common::build_test_app(store_with(&[])), "/api/v1/entities").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NO_ENTITIES");

    let response = get(common::build_test_app(seeded()), "/api/v1/entities?type=router").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entity_detail_shows_metrics() {
    let store = seeded();
    post_json(
        common::build_test_app(store.clone()),
        "/api/v1/entity",
        update_body("10.0.0.1", "Nmap Scanner", "Open Ports", "22,80"),
    )
    .await;

    let response = get(common::build_test_app(store), "/api/v1/entities/host/10.0.0.1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["identifier"], "10.0.0.1");
    assert_eq!(json["data"]["type"], "host");
    assert_eq!(
        json["data"]["metrics"],
        serde_json::json!([{"source": "Nmap Scanner", "name": "Open Ports", "value": "22,80"}])
    );
}

#[tokio::test]
async fn entity_detail_for_unknown_entity_is_404() {
    let response = get(
        common::build_test_app(seeded()),
        "/api/v1/entities/website/10.0.0.1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn entity_detail_with_bad_type_is_400() {
    let response = get(
        common::build_test_app(seeded()),
        "/api/v1/entities/router/10.0.0.1",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
