//! Unit tests for per-timeframe signal synthesis

use signalcast::config::PipelineConfig;
use signalcast::error::PipelineError;
use signalcast::indicators::structure::levels_from_range;
use signalcast::models::indicators::{FibonacciLevels, Trend};
use signalcast::models::series::Timeframe;
use signalcast::models::signal::Signal;
use signalcast::signals::{near_fibonacci_level, SignalInput, SignalSynthesizer};

const FLAT: [f64; 10] = [130.0; 10];

/// Levels 100, 123.6, 138.2, 150, 161.8, 200; 130 is not near any of them
fn levels() -> FibonacciLevels {
    levels_from_range(200.0, 100.0, Trend::Uptrend)
}

fn input<'a>(
    predicted_price: f64,
    rsi: f64,
    levels: &'a FibonacciLevels,
    recent: &'a [f64],
) -> SignalInput<'a> {
    SignalInput {
        timeframe: Timeframe::FifteenMinute,
        current_price: 130.0,
        predicted_price,
        rsi,
        fibonacci_levels: levels,
        recent_prices: recent,
    }
}

fn synthesizer() -> SignalSynthesizer {
    SignalSynthesizer::new(&PipelineConfig::default())
}

#[test]
fn test_buy_above_band() {
    let levels = levels();
    let signal = synthesizer()
        .generate_signal(&input(135.0, 50.0, &levels, &FLAT))
        .unwrap();
    assert_eq!(signal.signal, Signal::Buy);
    assert_eq!(signal.confidence, 100.0);
    assert!((signal.tolerance - 0.005).abs() < 1e-12);
    assert!(!signal.near_fibonacci_level);
}

#[test]
fn test_sell_below_band() {
    let levels = levels();
    let signal = synthesizer()
        .generate_signal(&input(125.0, 45.0, &levels, &FLAT))
        .unwrap();
    assert_eq!(signal.signal, Signal::Sell);
    assert!(signal.confidence > 0.0);
}

#[test]
fn test_hold_inside_band() {
    // Band is 130 * 0.005 = 0.65 either side
    let levels = levels();
    for predicted in [130.0, 130.5, 129.5] {
        let signal = synthesizer()
            .generate_signal(&input(predicted, 50.0, &levels, &FLAT))
            .unwrap();
        assert_eq!(signal.signal, Signal::Hold);
        assert_eq!(signal.confidence, 0.0);
    }
}

#[test]
fn test_confidence_is_capped() {
    let levels = levels();
    for predicted in [1_000_000.0, 131.0, 0.01] {
        let signal = synthesizer()
            .generate_signal(&input(predicted, 50.0, &levels, &FLAT))
            .unwrap();
        assert!(signal.confidence <= 100.0);
    }
}

#[test]
fn test_rsi_extremes_suppress_signal() {
    let levels = levels();
    for rsi in [70.1, 85.0, 29.9, 5.0] {
        let signal = synthesizer()
            .generate_signal(&input(200.0, rsi, &levels, &FLAT))
            .unwrap();
        assert_eq!(signal.signal, Signal::Hold, "rsi {}", rsi);
        assert_eq!(signal.confidence, 0.0);
    }

    // The band edges themselves are neutral
    for rsi in [70.0, 30.0] {
        let signal = synthesizer()
            .generate_signal(&input(200.0, rsi, &levels, &FLAT))
            .unwrap();
        assert_eq!(signal.signal, Signal::Buy, "rsi {}", rsi);
    }
}

#[test]
fn test_fibonacci_proximity_suppresses_signal() {
    // 138.5 is within 0.5% of the 38.2% level at 138.2
    let levels = levels();
    let recent = [138.5; 10];
    let mut near = input(150.0, 50.0, &levels, &recent);
    near.current_price = 138.5;

    let signal = synthesizer().generate_signal(&near).unwrap();
    assert_eq!(signal.signal, Signal::Hold);
    assert_eq!(signal.confidence, 0.0);
    assert!(signal.near_fibonacci_level);
}

#[test]
fn test_flat_market_holds() {
    let recent = [100.0; 100];
    let levels = levels_from_range(100.0, 100.0, Trend::Downtrend);
    let mut flat = input(100.0, 50.0, &levels, &recent);
    flat.current_price = 100.0;

    let signal = synthesizer().generate_signal(&flat).unwrap();
    assert_eq!(signal.signal, Signal::Hold);
    assert_eq!(signal.confidence, 0.0);
    assert!(signal.near_fibonacci_level);
}

#[test]
fn test_volatility_widens_tolerance() {
    let synth = synthesizer();
    assert_eq!(synth.tolerance(0.0), 0.005);
    assert!((synth.tolerance(1.0) - 0.01).abs() < 1e-12);
}

#[test]
fn test_invalid_prices_are_rejected() {
    let levels = levels();
    let mut zero = input(130.0, 50.0, &levels, &FLAT);
    zero.current_price = 0.0;
    assert!(matches!(
        synthesizer().generate_signal(&zero),
        Err(PipelineError::InvalidInput { .. })
    ));

    assert!(matches!(
        synthesizer().generate_signal(&input(f64::NAN, 50.0, &levels, &FLAT)),
        Err(PipelineError::InvalidInput { .. })
    ));
}

#[test]
fn test_short_recent_history_is_insufficient() {
    let levels = levels();
    assert!(matches!(
        synthesizer().generate_signal(&input(135.0, 50.0, &levels, &[130.0; 3])),
        Err(PipelineError::InsufficientData { .. })
    ));
}

#[test]
fn test_near_fibonacci_level_relative_distance() {
    let levels = levels();
    assert!(near_fibonacci_level(100.4, &levels, 0.005));
    assert!(!near_fibonacci_level(100.6, &levels, 0.005));
    assert!(near_fibonacci_level(199.5, &levels, 0.005));
    assert!(!near_fibonacci_level(130.0, &levels, 0.005));
}

#[test]
fn test_exponential_volatility_keeps_base_tolerance_on_full_window() {
    // Choppy history still leaves the band at 0.5%, so a 1% rise is a full buy
    let levels = levels();
    let recent = [100.0, 101.0, 99.0, 102.0, 98.0, 103.0];
    let mut choppy = input(104.0, 50.0, &levels, &recent);
    choppy.current_price = 103.0;

    let signal = synthesizer().generate_signal(&choppy).unwrap();
    assert!((signal.tolerance - 0.005).abs() < 1e-12);
    assert!(!signal.near_fibonacci_level);
    assert_eq!(signal.signal, Signal::Buy);
    assert_eq!(signal.confidence, 100.0);
}
