// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Catalog client against a local stand-in for the FDSN service

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quakeguard::catalog::{BoundingBox, CatalogClient, EventQuery, EventSource};
use quakeguard::config::CatalogConfig;
use quakeguard::event::classify_all;
use quakeguard::risk::{assess, RiskThresholds};
use quakeguard::tier::RiskTier;
use quakeguard::QuakeGuardError;
use tokio_test::{assert_err, assert_ok};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn feature(mag: f64, time_ms: i64, coords: [f64; 3]) -> serde_json::Value {
    serde_json::json!({
        "type": "Feature",
        "properties": {"mag": mag, "place": format!("M{} test", mag), "time": time_ms, "url": "https://example.org"},
        "geometry": {"type": "Point", "coordinates": coords}
    })
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/fdsnws/event/1/query", addr)
}

fn client(url: String, timeout_secs: u64) -> CatalogClient {
    CatalogClient::new(&CatalogConfig {
        url,
        timeout_secs,
        detailed_limit: 500,
        brief_limit: 200,
    })
    .unwrap()
}

fn query() -> EventQuery {
    EventQuery {
        min_magnitude: 2.5,
        hours: 24,
        region: Some(BoundingBox { min_lon: 122.9, min_lat: 24.0, max_lon: 146.0, max_lat: 45.6 }),
        limit: 500,
    }
}

#[tokio::test]
async fn test_fetch_sends_parameters_and_parses_events() {
    let seen: Seen = Arc::default();
    let recorder = seen.clone();

    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut features: Vec<serde_json::Value> = (0..11)
        .map(|i| feature(3.0, now_ms - i * 60_000, [140.0, 36.0, 10.0]))
        .collect();
    features.push(feature(5.8, now_ms - 3_600_000, [141.0, 37.0, 40.0]));
    let body = serde_json::json!({"type": "FeatureCollection", "features": features});

    let router = Router::new().route(
        "/fdsnws/event/1/query",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let recorder = recorder.clone();
            let body = body.clone();
            async move {
                recorder.lock().unwrap().push(params);
                Json(body)
            }
        }),
    );

    let client = client(serve(router).await, 30);
    let events = assert_ok!(client.fetch_events(&query()).await);
    assert_eq!(events.len(), 12);

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["format"], "geojson");
    assert_eq!(params["orderby"], "time");
    assert_eq!(params["minmagnitude"], "2.5");
    assert_eq!(params["limit"], "500");
    assert_eq!(params["minlatitude"], "24");
    assert_eq!(params["maxlongitude"], "146");
    assert!(params.contains_key("starttime"));
    assert!(params.contains_key("endtime"));

    let classified = classify_all(events, chrono::Utc::now());
    let assessment = assess(&classified, &RiskThresholds::default());
    assert_eq!(assessment.risk_score, 30);
    assert_eq!(assessment.risk_level, RiskTier::High);
}

#[tokio::test]
async fn test_server_error_is_distinguished_but_ui_path_is_empty() {
    let router = Router::new().route(
        "/fdsnws/event/1/query",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let client = client(serve(router).await, 30);

    let err = assert_err!(client.fetch_events(&query()).await);
    assert!(matches!(err, QuakeGuardError::CatalogStatus(503)));
    assert!(client.fetch_or_empty(&query()).await.is_empty());
}

#[tokio::test]
async fn test_timeout_yields_empty_window() {
    let router = Router::new().route(
        "/fdsnws/event/1/query",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(serde_json::json!({"features": []}))
        }),
    );
    let client = client(serve(router).await, 1);

    assert!(matches!(client.fetch_events(&query()).await, Err(QuakeGuardError::Http(_))));
    assert!(client.fetch_or_empty(&query()).await.is_empty());
}

#[tokio::test]
async fn test_invalid_query_is_rejected_before_sending() {
    let client = client("http://127.0.0.1:9/unused".to_string(), 1);
    let bad = EventQuery { hours: 0, ..query() };
    assert!(matches!(client.fetch_events(&bad).await, Err(QuakeGuardError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_oversized_lookback_is_rejected_not_fatal() {
    let client = client("http://127.0.0.1:9/unused".to_string(), 1);
    let huge = EventQuery { hours: u32::MAX, ..query() };

    let err = assert_err!(client.fetch_events(&huge).await);
    assert!(matches!(err, QuakeGuardError::InvalidQuery(_)));
    assert!(client.fetch_or_empty(&huge).await.is_empty());
}
