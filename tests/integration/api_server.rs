//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, and the signal endpoints.


use serde_json::Value;
use signalcast::services::StaticMarketDataProvider;
use std::sync::Arc;

use crate::test_utils::static_provider;
use test_utils::TestApiServer;

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "signalcast");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    for name in [
        "http_requests_total",
        "http_request_duration_seconds",
        "http_requests_in_flight",
        "pipeline_runs_total",
        "pipeline_failures_total",
    ] {
        assert!(body.contains(name), "Expected {} metric", name);
    }
}

#[tokio::test]
async fn latest_is_not_found_before_first_evaluation() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/api/signal/latest").await;
    assert_eq!(response.status_code(), 404);

    let body: Value = response.json();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn evaluate_returns_and_stores_payload() {
    let app = TestApiServer::new().await;

    let response = app.server.post("/api/signal/evaluate").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "ETH-USD");
    assert_eq!(body["signal"], "Buy: 100.00%");
    assert_eq!(body["decision"], "Buy");
    assert_eq!(body["current_price"], 121.0);
    assert_eq!(body["entry_price"], 121.0);
    assert_eq!(body["predicted_prices"].as_array().unwrap().len(), 60);
    assert_eq!(body["prices"].as_array().unwrap().len(), 100);
    assert!(body["fibonacci_levels"].get("61.8%").is_some());
    assert!(body["stop_loss"].as_f64().unwrap() < 121.0);
    assert!(body["take_profit"].as_f64().unwrap() > 121.0);

    let latest = app.server.get("/api/signal/latest").await;
    assert_eq!(latest.status_code(), 200);
    let latest: Value = latest.json();
    assert_eq!(latest["signal"], body["signal"]);
    assert_eq!(latest["generated_at"], body["generated_at"]);

    assert_eq!(app.metrics.pipeline_runs_total.get(), 1.0);
    assert_eq!(app.metrics.last_confidence.get(), 100.0);
    assert_eq!(app.metrics.market_data_connected.get(), 1.0);
}

#[tokio::test]
async fn missing_market_data_is_bad_gateway() {
    let app = TestApiServer::with_provider(Arc::new(StaticMarketDataProvider::new())).await;

    let response = app.server.post("/api/signal/evaluate").await;
    assert_eq!(response.status_code(), 502);

    assert_eq!(app.metrics.pipeline_failures_total.get(), 1.0);
    assert_eq!(app.metrics.market_data_connected.get(), 0.0);
    assert!(app.service.latest().await.is_none());
}

#[tokio::test]
async fn short_history_is_unprocessable() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let app = TestApiServer::with_provider(Arc::new(static_provider(&closes))).await;

    let response = app.server.post("/api/signal/evaluate").await;
    assert_eq!(response.status_code(), 422);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Insufficient data"));
}

#[tokio::test]
async fn prediction_metrics_score_previous_forecast() {
    let app = TestApiServer::new().await;

    let empty: Value = app.server.get("/api/predictions/metrics").await.json();
    assert!(empty["overall"].is_null());

    app.server.post("/api/signal/evaluate").await.assert_status_ok();
    app.server.post("/api/signal/evaluate").await.assert_status_ok();

    let response = app.server.get("/api/predictions/metrics").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    // Previous run forecast 148 for the next step, price is still 121
    assert_eq!(body["overall"]["count"], 1);
    assert!((body["overall"]["mae"].as_f64().unwrap() - 27.0).abs() < 1e-9);
    assert!(body["by_model"]["Combined"].is_object());
    assert!(body["by_model"].get("Hourly").is_none());
}
