pub mod momentum;
pub mod structure;
pub mod volatility;

pub use momentum::{calculate_rsi, calculate_rsi_default, NEUTRAL_RSI};
pub use structure::{calculate_fibonacci_levels, determine_trend, fibonacci_window};
pub use volatility::{calculate_volatility, simple_volatility, VolatilityParams};

use crate::error::PipelineResult;
use crate::models::indicators::IndicatorSet;
use crate::models::series::PriceSeries;

/// Compute the full indicator set for one series
pub fn compute_indicator_set(
    series: &PriceSeries,
    rsi_window: usize,
    volatility_window: usize,
) -> PipelineResult<IndicatorSet> {
    let timeframe = series.timeframe();
    let closes = series.closes();

    let rsi = calculate_rsi(&closes, rsi_window);
    let params = VolatilityParams::for_timeframe(timeframe).with_window(volatility_window);
    let volatility = calculate_volatility(&closes, &params)?;
    let (trend, fibonacci_levels) = fibonacci_window(&closes, timeframe.fibonacci_lookback())?;

    Ok(IndicatorSet {
        timeframe,
        rsi,
        volatility,
        trend,
        fibonacci_levels,
    })
}
