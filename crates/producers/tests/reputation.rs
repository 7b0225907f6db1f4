//! Runs the reputation producer against a local axum stand-in for the
//! CrowdSec Local API.

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use paranoia_core::entity::Target;
use paranoia_producers::{CrowdsecSettings, Producer, ReputationProducer};
use serde::Deserialize;

const API_KEY: &str = "bouncer-key";

#[derive(Deserialize)]
struct DecisionQuery {
    ip: String,
}

/// Canned LAPI: `10.0.0.66` is banned, `10.0.0.2` answers `[]`, `10.0.0.50`
/// triggers a 500, everything else answers `null`.
async fn decisions(headers: HeaderMap, Query(query): Query<DecisionQuery>) -> Response {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::FORBIDDEN, "{\"message\":\"access forbidden\"}").into_response();
    }

    let body = match query.ip.as_str() {
        "10.0.0.66" => {
            r#"[{"id":1,"origin":"crowdsec","type":"ban","scope":"Ip","value":"10.0.0.66","duration":"3h59m","scenario":"crowdsecurity/ssh-bf"}]"#
        }
        "10.0.0.2" => "[]",
        "10.0.0.50" => return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => "null",
    };
    ([("content-type", "application/json")], body).into_response()
}

/// Serve the stub on an ephemeral port and return its base URL.
async fn spawn_lapi() -> String {
    let app = Router::new().route("/v1/decisions", get(decisions));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn scan(lapi_url: &str, key: &str, ip: &str) -> Vec<(String, String)> {
    let settings = CrowdsecSettings {
        lapi_url: Some(lapi_url.to_string()),
        lapi_key: Some(key.to_string()),
    };
    let target = Target::new(ip, "host").unwrap();
    let producer = ReputationProducer::new(target, &settings, reqwest::Client::new()).unwrap();
    producer
        .scan()
        .await
        .into_iter()
        .map(|u| (u.metric().to_string(), u.value().to_string()))
        .collect()
}

fn status(value: &str) -> Vec<(String, String)> {
    vec![("Status".to_string(), value.to_string())]
}

#[tokio::test]
async fn listed_address_is_banned() {
    let url = spawn_lapi().await;
    assert_eq!(scan(&url, API_KEY, "10.0.0.66").await, status("Banned"));
}

#[tokio::test]
async fn null_response_is_not_banned() {
    let url = spawn_lapi().await;
    assert_eq!(scan(&url, API_KEY, "10.0.0.1").await, status("Not Banned"));
}

#[tokio::test]
async fn empty_list_is_not_banned() {
    let url = spawn_lapi().await;
    assert_eq!(scan(&url, API_KEY, "10.0.0.2").await, status("Not Banned"));
}

#[tokio::test]
async fn server_error_yields_no_updates() {
    let url = spawn_lapi().await;
    assert!(scan(&url, API_KEY, "10.0.0.50").await.is_empty());
}

#[tokio::test]
async fn wrong_key_yields_no_updates() {
    let url = spawn_lapi().await;
    assert!(scan(&url, "wrong-key", "10.0.0.66").await.is_empty());
}

#[tokio::test]
async fn unreachable_service_yields_no_updates() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(scan(&format!("http://{addr}"), API_KEY, "10.0.0.66")
        .await
        .is_empty());
}
