//! Unit tests for RSI indicator

use signalcast::indicators::momentum::{calculate_rsi, calculate_rsi_default, NEUTRAL_RSI};

#[test]
fn test_rsi_output_matches_input_length() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
    let rsi = calculate_rsi_default(&prices);
    assert_eq!(rsi.len(), prices.len());
}

#[test]
fn test_rsi_warmup_is_neutral() {
    let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let rsi = calculate_rsi(&prices, 14);
    assert!(rsi[..14].iter().all(|&v| v == NEUTRAL_RSI));
}

#[test]
fn test_rsi_zero_loss_window_is_neutral() {
    // Strictly rising: no losses anywhere, ratio undefined
    let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
    let rsi = calculate_rsi(&prices, 14);
    assert!(rsi.iter().all(|&v| v == 50.0));
}

#[test]
fn test_rsi_flat_series_is_neutral() {
    let rsi = calculate_rsi(&[250.0; 25], 14);
    assert!(rsi.iter().all(|&v| v == 50.0));
}

#[test]
fn test_rsi_balanced_moves_read_fifty() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i % 2) as f64).collect();
    let rsi = calculate_rsi(&prices, 14);
    assert!((rsi[29] - 50.0).abs() < 1e-9);
}

#[test]
fn test_rsi_known_ratio() {
    // +3 / -1 sawtooth: 7 gains of 3 and 7 losses of 1 per window, RS = 3
    let mut prices = vec![100.0];
    for k in 1..30 {
        let last = prices[k - 1];
        prices.push(if k % 2 == 1 { last + 3.0 } else { last - 1.0 });
    }
    let rsi = calculate_rsi(&prices, 14);
    assert!((rsi[29] - 75.0).abs() < 1e-9);
}

#[test]
fn test_rsi_falling_market_is_low() {
    let mut prices = vec![200.0];
    for k in 1..30 {
        let last = prices[k - 1];
        prices.push(if k % 2 == 1 { last - 3.0 } else { last + 1.0 });
    }
    let rsi = calculate_rsi(&prices, 14);
    assert!((rsi[29] - 25.0).abs() < 1e-9);
}

#[test]
fn test_rsi_bounds_hold_for_erratic_input() {
    let prices = [
        10.0, 1000.0, 0.5, 700.0, 3.0, 3.0, 900.0, 1.0, 50.0, 49.0, 51.0, 2000.0, 0.1, 5.0, 6.0,
        4.0, 8000.0, 7.0, 6.5, 6.4,
    ];
    let rsi = calculate_rsi(&prices, 5);
    assert!(rsi.iter().all(|v| (0.0..=100.0).contains(v)));
}

#[test]
fn test_rsi_short_input() {
    assert_eq!(calculate_rsi(&[1.0, 2.0], 14), vec![50.0, 50.0]);
    assert!(calculate_rsi(&[], 14).is_empty());
}
