//! Integration tests for how the signal service handles overlapping runs

use crate::test_utils::{buy_market, constant_pipeline, static_provider, GatedProvider};
use signalcast::core::SignalService;
use signalcast::metrics::Metrics;
use signalcast::models::signal::Signal;
use signalcast::services::PredictionLog;
use std::sync::Arc;

#[tokio::test]
async fn data_requests_are_skipped_while_a_run_is_in_flight() {
    let provider = GatedProvider::new(static_provider(&buy_market()));
    let started = provider.started.clone();
    let release = provider.release.clone();
    let metrics = Arc::new(Metrics::new().unwrap());
    let service = Arc::new(SignalService::new(
        "ETH-USD",
        Arc::new(provider),
        Arc::new(constant_pipeline(1.0)),
        metrics.clone(),
    ));

    let running = tokio::spawn({
        let service = service.clone();
        async move { service.evaluate().await }
    });
    started.notified().await;

    // Blocked in market data fetch, so an on-demand request is dropped
    assert!(service.evaluate_if_idle().await.is_none());
    assert!(service.evaluate_if_idle().await.is_none());

    release.add_permits(2);
    let payload = running.await.unwrap().unwrap();
    assert_eq!(payload.decision, Signal::Buy);
    assert_eq!(metrics.pipeline_runs_total.get(), 1.0);

    release.add_permits(2);
    let next = service.evaluate_if_idle().await.expect("service should be idle");
    assert_eq!(next.unwrap().decision, Signal::Buy);
    assert_eq!(metrics.pipeline_runs_total.get(), 2.0);
}

#[tokio::test]
async fn concurrent_evaluations_score_each_other_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prediction_log.csv");
    let service = SignalService::new(
        "ETH-USD",
        Arc::new(static_provider(&buy_market())),
        Arc::new(constant_pipeline(1.0)),
        Arc::new(Metrics::new().unwrap()),
    )
    .with_prediction_log(PredictionLog::new(&path));

    let (first, second) = tokio::join!(service.evaluate(), service.evaluate());
    first.unwrap();
    second.unwrap();

    // The second run sees the first one's payload as the previous forecast
    let entries = PredictionLog::new(&path).read_entries().unwrap();
    let models: Vec<&str> = entries.iter().map(|e| e.model_type.as_str()).collect();
    assert_eq!(
        models,
        vec!["15-minute", "Hourly", "15-minute", "Hourly", "Combined"]
    );
    assert_eq!(entries[4].predicted_price, 148.0);
    assert_eq!(entries[4].actual_price, Some(121.0));
}
