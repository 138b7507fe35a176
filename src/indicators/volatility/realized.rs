//! Annualized realized volatility from log-returns
//!
//! This is the canonical volatility of the pipeline. The plain rolling
//! variant in `rolling.rs` is per-period and must not be compared against it.

use crate::common::math;
use crate::error::{PipelineError, PipelineResult};
use crate::models::series::Timeframe;
use tracing::debug;

/// Outliers at or beyond this z-score are dropped when cleaning
pub const OUTLIER_Z_SCORE: f64 = 3.0;

pub const DEFAULT_VOLATILITY_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityParams {
    pub window: usize,
    pub exponential_weighting: bool,
    pub clean: bool,
    pub periods_per_year: f64,
}

impl VolatilityParams {
    /// Default window of 5, plain weighting, cleaning on
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        Self {
            window: DEFAULT_VOLATILITY_WINDOW,
            exponential_weighting: false,
            clean: true,
            periods_per_year: timeframe.periods_per_year(),
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_exponential_weighting(mut self, enabled: bool) -> Self {
        self.exponential_weighting = enabled;
        self
    }

    pub fn with_cleaning(mut self, enabled: bool) -> Self {
        self.clean = enabled;
        self
    }
}

/// Calculate annualized volatility of `prices`
///
/// 1. Optionally clean: non-finite values become the finite mean, then
///    points with |z| >= 3 are dropped (skipped when the std is zero)
/// 2. Log-returns of consecutive prices
/// 3. Std of the last `window` returns; with exponential weighting those
///    returns are first convolved ('valid' mode) with `window` normalized
///    weights, which leaves a single point and so a zero std once `window`
///    returns are available
/// 4. Scale by sqrt(periods per year)
pub fn calculate_volatility(prices: &[f64], params: &VolatilityParams) -> PipelineResult<f64> {
    if params.window == 0 {
        return Err(PipelineError::invalid("volatility", "window must be positive"));
    }
    if prices.len() < params.window + 1 {
        return Err(PipelineError::insufficient(
            format!("volatility (window {})", params.window),
            params.window + 1,
            prices.len(),
        ));
    }

    let cleaned = if params.clean {
        clean_prices(prices)?
    } else {
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(PipelineError::invalid(
                "volatility",
                "series contains non-finite prices",
            ));
        }
        prices.to_vec()
    };

    if cleaned.iter().any(|&p| p <= 0.0) {
        return Err(PipelineError::invalid(
            "volatility",
            "log-returns need strictly positive prices",
        ));
    }

    let returns = math::log_returns(&cleaned);
    if returns.is_empty() {
        return Err(PipelineError::insufficient(
            "volatility after outlier removal",
            params.window + 1,
            cleaned.len(),
        ));
    }

    let recent = math::tail(&returns, params.window);
    let per_period = if params.exponential_weighting {
        let weights = exponential_weights(params.window);
        math::std_dev(&math::convolve_valid(recent, &weights))
    } else {
        math::std_dev(recent)
    }
    .unwrap_or(0.0);

    let annualized = (per_period * params.periods_per_year.sqrt()).max(0.0);

    debug!(
        per_period,
        annualized,
        window = params.window,
        exponential = params.exponential_weighting,
        "Volatility calculated"
    );

    Ok(annualized)
}

/// Normalized weights `exp(linspace(-1, 0, n))`, heaviest on the last element
pub fn exponential_weights(n: usize) -> Vec<f64> {
    let raw: Vec<f64> = math::linspace(-1.0, 0.0, n)
        .into_iter()
        .map(f64::exp)
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

fn clean_prices(prices: &[f64]) -> PipelineResult<Vec<f64>> {
    let finite: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite()).collect();
    let fill = math::mean(&finite)
        .ok_or_else(|| PipelineError::invalid("volatility", "no finite prices"))?;

    let filled: Vec<f64> = prices
        .iter()
        .map(|&p| if p.is_finite() { p } else { fill })
        .collect();

    let (mean, std) = match (math::mean(&filled), math::std_dev(&filled)) {
        (Some(mean), Some(std)) => (mean, std),
        _ => return Ok(filled),
    };

    if std == 0.0 {
        return Ok(filled);
    }

    Ok(filled
        .into_iter()
        .filter(|p| ((p - mean) / std).abs() < OUTLIER_Z_SCORE)
        .collect())
}
