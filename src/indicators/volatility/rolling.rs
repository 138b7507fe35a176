//! Simple per-period rolling volatility
//!
//! Plain standard deviation of the last `window` log-returns, not annualized.
//! Only used to gate forecast dampening.

use crate::common::math;

/// Per-period volatility, 0.0 when fewer than `window` prices are available
pub fn simple_volatility(prices: &[f64], window: usize) -> f64 {
    if window == 0 || prices.len() < window {
        return 0.0;
    }
    let returns = math::log_returns(prices);
    let volatility = math::std_dev(math::tail(&returns, window)).unwrap_or(0.0);
    if volatility.is_finite() {
        volatility
    } else {
        0.0
    }
}
