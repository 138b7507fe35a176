//! Per-timeframe signal synthesis from forecast, RSI, Fibonacci levels and volatility

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::indicators::volatility::{calculate_volatility, VolatilityParams};
use crate::models::indicators::FibonacciLevels;
use crate::models::series::Timeframe;
use crate::models::signal::{Signal, TimeframeSignal};
use tracing::debug;

/// Everything the synthesizer looks at for one timeframe
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub timeframe: Timeframe,
    pub current_price: f64,
    pub predicted_price: f64,
    pub rsi: f64,
    pub fibonacci_levels: &'a FibonacciLevels,
    pub recent_prices: &'a [f64],
}

pub struct SignalSynthesizer {
    rsi_overbought: f64,
    rsi_oversold: f64,
    base_tolerance: f64,
    volatility_window: usize,
}

impl SignalSynthesizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            rsi_overbought: config.rsi_overbought,
            rsi_oversold: config.rsi_oversold,
            base_tolerance: config.base_tolerance,
            volatility_window: config.volatility_window,
        }
    }

    /// Tolerance band widened by volatility: `base * (1 + volatility)`
    pub fn tolerance(&self, volatility: f64) -> f64 {
        self.base_tolerance * (1.0 + volatility)
    }

    /// Decide Buy/Sell/Hold with a confidence in [0, 100].
    ///
    /// Overbought/oversold RSI or a price sitting on a Fibonacci level
    /// suppresses the signal entirely (Hold, 0).
    pub fn generate_signal(&self, input: &SignalInput<'_>) -> PipelineResult<TimeframeSignal> {
        if !(input.current_price.is_finite() && input.current_price > 0.0) {
            return Err(PipelineError::invalid(
                "signal synthesis",
                format!("current price must be positive, got {}", input.current_price),
            ));
        }
        if !input.predicted_price.is_finite() {
            return Err(PipelineError::invalid(
                "signal synthesis",
                "predicted price is not finite",
            ));
        }

        let params = VolatilityParams::for_timeframe(input.timeframe)
            .with_window(self.volatility_window)
            .with_exponential_weighting(true);
        let volatility = calculate_volatility(input.recent_prices, &params)?;
        let tolerance = self.tolerance(volatility);
        let near_level = near_fibonacci_level(input.current_price, input.fibonacci_levels, tolerance);

        match self.analyze_rsi(input.rsi) {
            RsiAnalysis::Overbought | RsiAnalysis::Oversold => {
                debug!(
                    timeframe = %input.timeframe,
                    rsi = input.rsi,
                    "RSI outside neutral band, holding"
                );
                return Ok(TimeframeSignal::hold(input.timeframe, tolerance, near_level));
            }
            RsiAnalysis::Neutral => {}
        }

        if near_level {
            debug!(
                timeframe = %input.timeframe,
                price = input.current_price,
                tolerance,
                "Price pinned at a Fibonacci level, holding"
            );
            return Ok(TimeframeSignal::hold(input.timeframe, tolerance, near_level));
        }

        let difference = (input.predicted_price - input.current_price).abs();
        let confidence = (difference / (input.current_price * tolerance) * 100.0).min(100.0);

        let signal = if input.predicted_price > input.current_price * (1.0 + tolerance) {
            Signal::Buy
        } else if input.predicted_price < input.current_price * (1.0 - tolerance) {
            Signal::Sell
        } else {
            return Ok(TimeframeSignal::hold(input.timeframe, tolerance, near_level));
        };

        debug!(
            timeframe = %input.timeframe,
            signal = %signal,
            confidence,
            volatility,
            tolerance,
            "Timeframe signal generated"
        );

        Ok(TimeframeSignal {
            timeframe: input.timeframe,
            signal,
            confidence,
            tolerance,
            near_fibonacci_level: false,
        })
    }

    fn analyze_rsi(&self, rsi: f64) -> RsiAnalysis {
        if rsi > self.rsi_overbought {
            RsiAnalysis::Overbought
        } else if rsi < self.rsi_oversold {
            RsiAnalysis::Oversold
        } else {
            RsiAnalysis::Neutral
        }
    }
}

/// True when `price` is within relative `tolerance` of any level
pub fn near_fibonacci_level(price: f64, levels: &FibonacciLevels, tolerance: f64) -> bool {
    levels.prices().any(|level| {
        if level == 0.0 {
            price == 0.0
        } else {
            (price - level).abs() / level.abs() < tolerance
        }
    })
}

enum RsiAnalysis {
    Overbought,
    Oversold,
    Neutral,
}
