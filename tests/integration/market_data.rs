//! Integration tests for the Yahoo chart provider against a mock server

use serde_json::json;
use signalcast::error::ServiceError;
use signalcast::models::series::Timeframe;
use signalcast::services::{MarketDataProvider, YahooChartProvider};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART_PATH: &str = "/v8/finance/chart/ETH-USD";

fn chart_body() -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "ETH-USD" },
                "timestamp": [1704067200, 1704068100, 1704069000],
                "indicators": { "quote": [{ "close": [2281.5, null, 2290.25] }] }
            }],
            "error": null
        }
    })
}

fn provider(server: &MockServer, max_retries: usize) -> YahooChartProvider {
    YahooChartProvider::new(format!("{}/", server.uri()))
        .with_retry_policy(max_retries, Duration::from_millis(1))
}

#[tokio::test]
async fn fetches_chart_for_timeframe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .and(query_param("interval", "15m"))
        .and(query_param("range", "30d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server, 0)
        .fetch_series("ETH-USD", Timeframe::FifteenMinute)
        .await
        .expect("chart parses");

    assert_eq!(series.timeframe, Timeframe::FifteenMinute);
    assert_eq!(series.len(), 3);
    assert_eq!(series.closes, Some(vec![Some(2281.5), None, Some(2290.25)]));
    assert_eq!(series.timestamps[0].timestamp(), 1_704_067_200);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = provider(&server, 2)
        .fetch_series("ETH-USD", Timeframe::Hourly)
        .await;
    assert!(matches!(result, Err(ServiceError::Http(_))));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server, 3)
        .fetch_series("ETH-USD", Timeframe::Hourly)
        .await;
    assert!(matches!(result, Err(ServiceError::Http(_))));
}

#[tokio::test]
async fn chart_error_payload_is_market_data_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })))
        .mount(&server)
        .await;

    let result = provider(&server, 0)
        .fetch_series("NOPE", Timeframe::Hourly)
        .await;
    match result {
        Err(ServiceError::MarketData(message)) => assert!(message.contains("NOPE")),
        other => panic!("expected market data error, got {:?}", other.map(|s| s.len())),
    }
}
