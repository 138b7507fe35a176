//! End-to-end tests of the signal pipeline with deterministic models

use crate::test_utils::{
    pipeline_with, ramp_then_oscillation, ramp_then_sawtooth, series, shared, ConstantModel,
};
use signalcast::config::{DampeningConfig, PipelineConfig};
use signalcast::error::PipelineError;
use signalcast::forecasting::{Forecaster, MultiHorizonForecaster};
use signalcast::models::indicators::FibLevel;
use signalcast::models::series::Timeframe;
use signalcast::models::signal::Signal;
use signalcast::signals::SignalPipeline;

#[test]
fn test_flat_market_holds() {
    let flat = [100.0; 100];
    let short = series(Timeframe::FifteenMinute, &flat);
    let long = series(Timeframe::Hourly, &flat);

    let payload = pipeline_with(shared(ConstantModel(0.0)))
        .run("ETH-USD", &short, &long)
        .unwrap();

    assert_eq!(payload.decision, Signal::Hold);
    assert_eq!(payload.signal, "Hold");
    assert_eq!(payload.confidence, 0.0);
    assert_eq!(payload.entry_price, None);
    assert_eq!(payload.stop_loss, None);
    assert_eq!(payload.take_profit, None);
    assert_eq!(payload.volatility, 0.0);
    assert_eq!(payload.current_price, 100.0);
    assert_eq!(payload.predicted_prices, vec![100.0; 60]);
    assert!(payload.rsi.iter().all(|&v| v == 50.0));
    assert!(payload.fibonacci_levels.prices().all(|p| p == 100.0));
    assert_eq!(payload.prices.len(), 100);
}

#[test]
fn test_both_timeframes_buy() {
    let prices = ramp_then_oscillation();
    let short = series(Timeframe::FifteenMinute, &prices);
    let long = series(Timeframe::Hourly, &prices);

    let payload = pipeline_with(shared(ConstantModel(1.0)))
        .run("ETH-USD", &short, &long)
        .unwrap();

    assert_eq!(payload.current_price, 121.0);
    assert_eq!(payload.predicted_price, 148.0);
    assert_eq!(payload.decision, Signal::Buy);
    assert_eq!(payload.confidence, 100.0);
    assert_eq!(payload.signal, "Buy: 100.00%");
    assert_eq!(payload.entry_price, Some(121.0));

    let stop_loss = payload.stop_loss.unwrap();
    let take_profit = payload.take_profit.unwrap();
    assert!(stop_loss < 121.0 && 121.0 < take_profit);

    assert_eq!(payload.timeframes.len(), 2);
    assert_eq!(payload.timeframes[0].timeframe, Timeframe::FifteenMinute);
    assert_eq!(payload.timeframes[1].timeframe, Timeframe::Hourly);
    assert!(payload.timeframes.iter().all(|t| t.signal == Signal::Buy));
    assert_eq!(payload.fibonacci_levels.get(FibLevel::Full), Some(148.0));
}

#[test]
fn test_both_timeframes_sell() {
    let prices = ramp_then_oscillation();
    let short = series(Timeframe::FifteenMinute, &prices);
    let long = series(Timeframe::Hourly, &prices);

    let payload = pipeline_with(shared(ConstantModel(0.0)))
        .run("ETH-USD", &short, &long)
        .unwrap();

    assert_eq!(payload.predicted_price, 50.0);
    assert_eq!(payload.decision, Signal::Sell);
    let stop_loss = payload.stop_loss.unwrap();
    let take_profit = payload.take_profit.unwrap();
    assert!(take_profit < 121.0 && 121.0 < stop_loss);
    assert!(take_profit > 0.0);
}

#[test]
fn test_disagreement_holds_with_mean_confidence() {
    // Long series ends overbought (RSI 75) so its timeframe holds
    let short = series(Timeframe::FifteenMinute, &ramp_then_oscillation());
    let long = series(Timeframe::Hourly, &ramp_then_sawtooth());

    let payload = pipeline_with(shared(ConstantModel(1.0)))
        .run("ETH-USD", &short, &long)
        .unwrap();

    assert_eq!(payload.predicted_price, 149.5);
    assert_eq!(payload.timeframes[0].signal, Signal::Buy);
    assert_eq!(payload.timeframes[1].signal, Signal::Hold);
    assert!((payload.timeframes[1].rsi - 75.0).abs() < 1e-9);
    assert_eq!(payload.timeframes[0].forecast_price, 148.0);
    assert_eq!(payload.timeframes[1].forecast_price, 151.0);

    assert_eq!(payload.decision, Signal::Hold);
    assert_eq!(payload.confidence, 50.0);
    assert_eq!(payload.entry_price, None);
    assert_eq!(payload.signal, "Hold");
}

#[test]
fn test_dampening_scales_forecast() {
    let prices = ramp_then_oscillation();
    let short = series(Timeframe::FifteenMinute, &prices);
    let long = series(Timeframe::Hourly, &prices);

    let config = PipelineConfig {
        dampening: Some(DampeningConfig {
            window: 5,
            threshold: 0.0,
            factor: 0.5,
        }),
        ..PipelineConfig::default()
    };
    let model = shared(ConstantModel(1.0));
    let forecaster = MultiHorizonForecaster::new(
        Forecaster::new(model.clone(), config.sequence_length, config.horizon),
        Forecaster::new(model, config.sequence_length, config.horizon),
    );

    let payload = SignalPipeline::new(config, forecaster)
        .run("ETH-USD", &short, &long)
        .unwrap();

    assert_eq!(payload.predicted_price, 74.0);
    assert_eq!(payload.predicted_prices, vec![74.0; 60]);
    // Undampened per-timeframe forecasts stay in the breakdown
    assert_eq!(payload.timeframes[0].forecast_price, 148.0);
}

#[test]
fn test_short_history_fails_whole_run() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let short = series(Timeframe::FifteenMinute, &prices);
    let long = series(Timeframe::Hourly, &prices);

    let result = pipeline_with(shared(ConstantModel(0.5))).run("ETH-USD", &short, &long);
    assert!(matches!(
        result,
        Err(PipelineError::InsufficientData { required: 59, actual: 30, .. })
    ));
}

#[test]
fn test_long_series_below_volatility_window_fails() {
    let short = series(Timeframe::FifteenMinute, &ramp_then_oscillation());
    let long = series(Timeframe::Hourly, &[100.0, 101.0, 102.0]);

    let pipeline = pipeline_with(shared(ConstantModel(0.5)));
    assert!(matches!(
        pipeline.run("ETH-USD", &short, &long),
        Err(PipelineError::InsufficientData { required: 6, actual: 3, .. })
    ));
}

#[test]
fn test_min_points() {
    let pipeline = pipeline_with(shared(ConstantModel(0.5)));
    assert_eq!(pipeline.min_points(), 59);
}
