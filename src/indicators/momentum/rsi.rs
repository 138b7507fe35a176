//! RSI (Relative Strength Index) indicator

/// Neutral RSI reported when the ratio is undefined
pub const NEUTRAL_RSI: f64 = 50.0;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Calculate the RSI series, one value per input price
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = mean gain / mean loss over the trailing `period` price changes
///
/// The first `period` positions lack a full window and read 50. Windows
/// whose mean loss is exactly zero also read 50.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut rsi = vec![NEUTRAL_RSI; prices.len()];
    if period == 0 || prices.len() <= period {
        return rsi;
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else if change < 0.0 {
            gains.push(0.0);
            losses.push(-change);
        } else {
            // Also covers NaN changes, which count as flat
            gains.push(0.0);
            losses.push(0.0);
        }
    }

    // rsi[i] uses the changes ending at price i, i.e. gains[i - period..i]
    for i in period..prices.len() {
        let avg_gain: f64 = gains[i - period..i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[i - period..i].iter().sum::<f64>() / period as f64;

        if avg_loss == 0.0 {
            continue;
        }

        let rs = avg_gain / avg_loss;
        rsi[i] = (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0);
    }

    rsi
}

/// Calculate RSI with default period (14)
pub fn calculate_rsi_default(prices: &[f64]) -> Vec<f64> {
    calculate_rsi(prices, DEFAULT_RSI_PERIOD)
}
