//! Market data providers for the short and long price series.

use crate::config::get_market_data_url;
use crate::error::{ServiceError, ServiceResult};
use crate::models::series::{RawSeries, Timeframe};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch raw close rows for `symbol` sampled at `timeframe`
    async fn fetch_series(&self, symbol: &str, timeframe: Timeframe) -> ServiceResult<RawSeries>;
}

/// Yahoo Finance v8 chart API
pub struct YahooChartProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: usize,
    min_retry_delay: Duration,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 3,
            min_retry_delay: Duration::from_secs(1),
        }
    }

    /// Provider pointed at `MARKET_DATA_URL` (or the public endpoint)
    pub fn from_env() -> Self {
        Self::new(get_market_data_url())
    }

    pub fn with_retry_policy(mut self, max_retries: usize, min_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.min_retry_delay = min_delay;
        self
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    async fn fetch_once(&self, symbol: &str, timeframe: Timeframe) -> ServiceResult<RawSeries> {
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("interval", timeframe.interval()), ("range", timeframe.range())])
            .send()
            .await?
            .error_for_status()?;

        let body: ChartResponse = response.json().await?;
        parse_chart(symbol, timeframe, body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    async fn fetch_series(&self, symbol: &str, timeframe: Timeframe) -> ServiceResult<RawSeries> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_retry_delay)
            .with_max_times(self.max_retries);

        let series = (|| self.fetch_once(symbol, timeframe))
            .retry(backoff)
            .when(is_retryable)
            .notify(|e, delay| {
                warn!(
                    symbol,
                    timeframe = %timeframe,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Market data request failed, retrying"
                );
            })
            .await?;

        debug!(
            symbol,
            timeframe = %timeframe,
            rows = series.len(),
            "Fetched market data"
        );
        Ok(series)
    }
}

/// Transport failures and 5xx are retried; 4xx and malformed bodies are not
fn is_retryable(error: &ServiceError) -> bool {
    match error {
        ServiceError::Http(e) => !e.is_decode() && !e.status().is_some_and(|s| s.is_client_error()),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

fn parse_chart(symbol: &str, timeframe: Timeframe, body: ChartResponse) -> ServiceResult<RawSeries> {
    if let Some(error) = body.chart.error {
        return Err(ServiceError::MarketData(format!(
            "{} for {}: {}",
            error.code, symbol, error.description
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ServiceError::MarketData(format!("no chart result for {}", symbol)))?;

    let timestamps = result
        .timestamp
        .iter()
        .map(|&secs| {
            DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
                ServiceError::MarketData(format!("invalid timestamp {} for {}", secs, symbol))
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    let closes = result.indicators.quote.into_iter().next().and_then(|q| q.close);

    Ok(RawSeries {
        timeframe,
        timestamps,
        closes,
    })
}

/// Serves fixed series per timeframe; for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticMarketDataProvider {
    series: HashMap<Timeframe, RawSeries>,
}

impl StaticMarketDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: RawSeries) -> Self {
        self.series.insert(series.timeframe, series);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketDataProvider {
    async fn fetch_series(&self, symbol: &str, timeframe: Timeframe) -> ServiceResult<RawSeries> {
        self.series.get(&timeframe).cloned().ok_or_else(|| {
            ServiceError::MarketData(format!("no {} series configured for {}", timeframe, symbol))
        })
    }
}
