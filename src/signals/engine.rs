//! Pipeline orchestrator: scale, indicators, forecast, per-timeframe signals, combined decision.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::forecasting::{apply_dampening, MultiHorizonForecaster};
use crate::indicators::{compute_indicator_set, NEUTRAL_RSI};
use crate::models::indicators::IndicatorSet;
use crate::models::payload::{DecisionPayload, TimeframeBreakdown};
use crate::models::series::PriceSeries;
use crate::models::signal::TimeframeSignal;
use crate::preprocessing::fit_transform;
use crate::signals::decision::DecisionCombiner;
use crate::signals::synthesizer::{SignalInput, SignalSynthesizer};
use chrono::Utc;
use tracing::{debug, info};

pub struct SignalPipeline {
    config: PipelineConfig,
    forecaster: MultiHorizonForecaster,
    synthesizer: SignalSynthesizer,
    combiner: DecisionCombiner,
}

impl SignalPipeline {
    pub fn new(config: PipelineConfig, forecaster: MultiHorizonForecaster) -> Self {
        let synthesizer = SignalSynthesizer::new(&config);
        let combiner = DecisionCombiner::new(&config);
        Self {
            config,
            forecaster,
            synthesizer,
            combiner,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn forecaster(&self) -> &MultiHorizonForecaster {
        &self.forecaster
    }

    /// Fewest points a series needs for both the forecast window and volatility
    pub fn min_points(&self) -> usize {
        self.config
            .sequence_length
            .max(self.config.volatility_window + 1)
    }

    /// Run the whole chain for one symbol.
    ///
    /// The short series drives the displayed prices, RSI, Fibonacci levels
    /// and current price; the long series only contributes its forecast
    /// and its own timeframe signal.
    pub fn run(
        &self,
        symbol: &str,
        short: &PriceSeries,
        long: &PriceSeries,
    ) -> PipelineResult<DecisionPayload> {
        if short.is_empty() {
            return Err(PipelineError::insufficient(
                format!("{} series", short.timeframe()),
                1,
                0,
            ));
        }
        if long.is_empty() {
            return Err(PipelineError::insufficient(
                format!("{} series", long.timeframe()),
                1,
                0,
            ));
        }

        let short_closes = short.closes();
        let long_closes = long.closes();
        let current_price = short.last_close().ok_or_else(|| {
            PipelineError::insufficient(format!("{} series", short.timeframe()), 1, 0)
        })?;

        let short_scaled = fit_transform(&short_closes)?;
        let long_scaled = fit_transform(&long_closes)?;

        let short_indicators = self.indicators(short)?;
        let long_indicators = self.indicators(long)?;

        let forecast = self.forecaster.predict(&short_scaled, &long_scaled)?;
        let predicted_prices = match &self.config.dampening {
            Some(dampening) => apply_dampening(&forecast.combined, &short_closes, dampening),
            None => forecast.combined.clone(),
        };
        let predicted_price = predicted_prices.last().copied().ok_or_else(|| {
            PipelineError::invalid("forecast", "forecast horizon must be positive")
        })?;

        debug!(
            symbol,
            current_price,
            predicted_price,
            horizon = predicted_prices.len(),
            "Forecast combined"
        );

        let short_signal =
            self.timeframe_signal(&short_indicators, &short_closes, current_price, predicted_price)?;
        let long_signal =
            self.timeframe_signal(&long_indicators, &long_closes, current_price, predicted_price)?;

        let mean_volatility = (short_indicators.volatility + long_indicators.volatility) / 2.0;
        let combined = self
            .combiner
            .combine(&short_signal, &long_signal, current_price, mean_volatility);

        info!(
            symbol,
            decision = %combined.signal,
            confidence = combined.confidence,
            current_price,
            predicted_price,
            short_signal = %short_signal.signal,
            long_signal = %long_signal.signal,
            "Pipeline decision: {}",
            combined.label()
        );

        let timeframes = vec![
            breakdown(&short_signal, &short_indicators, &forecast.short),
            breakdown(&long_signal, &long_indicators, &forecast.long),
        ];

        Ok(DecisionPayload {
            symbol: symbol.to_string(),
            generated_at: Utc::now(),
            prices: short_closes,
            predicted_price,
            predicted_prices,
            current_price,
            rsi: short_indicators.rsi.clone(),
            signal: combined.label(),
            decision: combined.signal,
            confidence: combined.confidence,
            entry_price: combined.entry_price,
            stop_loss: combined.stop_loss,
            take_profit: combined.take_profit,
            fibonacci_levels: short_indicators.fibonacci_levels.clone(),
            volatility: short_indicators.volatility,
            timeframes,
        })
    }

    fn indicators(&self, series: &PriceSeries) -> PipelineResult<IndicatorSet> {
        compute_indicator_set(
            series,
            self.config.rsi_window,
            self.config.volatility_window,
        )
    }

    fn timeframe_signal(
        &self,
        indicators: &IndicatorSet,
        closes: &[f64],
        current_price: f64,
        predicted_price: f64,
    ) -> PipelineResult<TimeframeSignal> {
        self.synthesizer.generate_signal(&SignalInput {
            timeframe: indicators.timeframe,
            current_price,
            predicted_price,
            rsi: indicators.last_rsi().unwrap_or(NEUTRAL_RSI),
            fibonacci_levels: &indicators.fibonacci_levels,
            recent_prices: closes,
        })
    }
}

fn breakdown(
    signal: &TimeframeSignal,
    indicators: &IndicatorSet,
    forecast: &[f64],
) -> TimeframeBreakdown {
    TimeframeBreakdown::new(
        signal,
        indicators.last_rsi().unwrap_or(NEUTRAL_RSI),
        indicators.volatility,
        indicators.trend,
        forecast.last().copied().unwrap_or_default(),
    )
}
