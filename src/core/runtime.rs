//! Signal service: fetch, run the pipeline off the async runtime, record, publish

use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::evaluation::{evaluate_by_model, evaluate_predictions, ForecastMetrics};
use crate::forecasting::{Forecaster, LstmRegressor, MultiHorizonForecaster};
use crate::metrics::Metrics;
use crate::models::payload::DecisionPayload;
use crate::models::series::Timeframe;
use crate::preprocessing::preprocess;
use crate::services::market_data::MarketDataProvider;
use crate::services::prediction_log::{PredictionEntry, PredictionLog, SignalLog};
use crate::signals::engine::SignalPipeline;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub const COMBINED_MODEL_LABEL: &str = "Combined";
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Accuracy summary served by `/api/predictions/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub overall: Option<ForecastMetrics>,
    pub by_model: BTreeMap<String, ForecastMetrics>,
}

pub struct SignalService {
    symbol: String,
    provider: Arc<dyn MarketDataProvider>,
    pipeline: Arc<SignalPipeline>,
    metrics: Arc<Metrics>,
    prediction_log: Option<Arc<PredictionLog>>,
    signal_log: Option<Arc<SignalLog>>,
    /// Held for a whole evaluation so runs never overlap
    run_gate: Mutex<()>,
    latest: RwLock<Option<DecisionPayload>>,
    updates: broadcast::Sender<DecisionPayload>,
}

impl SignalService {
    pub fn new(
        symbol: impl Into<String>,
        provider: Arc<dyn MarketDataProvider>,
        pipeline: Arc<SignalPipeline>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            symbol: symbol.into(),
            provider,
            pipeline,
            metrics,
            prediction_log: None,
            signal_log: None,
            run_gate: Mutex::new(()),
            latest: RwLock::new(None),
            updates,
        }
    }

    /// Load both models and wire the logs named in `config`
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn MarketDataProvider>,
        metrics: Arc<Metrics>,
    ) -> ServiceResult<Self> {
        let pipeline_config = config.pipeline_config();
        let short_model = Arc::new(LstmRegressor::load(&config.short_model_path)?);
        let long_model = Arc::new(LstmRegressor::load(&config.long_model_path)?);

        let forecaster = MultiHorizonForecaster::new(
            Forecaster::new(
                short_model,
                pipeline_config.sequence_length,
                pipeline_config.horizon,
            ),
            Forecaster::new(
                long_model,
                pipeline_config.sequence_length,
                pipeline_config.horizon,
            ),
        );
        let pipeline = Arc::new(SignalPipeline::new(pipeline_config, forecaster));

        Ok(Self::new(config.symbol.clone(), provider, pipeline, metrics)
            .with_prediction_log(PredictionLog::new(&config.prediction_log_path))
            .with_signal_log(SignalLog::new(&config.signal_log_path)))
    }

    pub fn with_prediction_log(mut self, log: PredictionLog) -> Self {
        self.prediction_log = Some(Arc::new(log));
        self
    }

    pub fn with_signal_log(mut self, log: SignalLog) -> Self {
        self.signal_log = Some(Arc::new(log));
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Receiver for every successful payload
    pub fn subscribe(&self) -> broadcast::Receiver<DecisionPayload> {
        self.updates.subscribe()
    }

    /// Most recent successful payload
    pub async fn latest(&self) -> Option<DecisionPayload> {
        self.latest.read().await.clone()
    }

    /// One full evaluation, queued behind any run in flight.
    /// On failure the previous payload stays in place.
    pub async fn evaluate(&self) -> ServiceResult<DecisionPayload> {
        let _run = self.run_gate.lock().await;
        self.evaluate_locked().await
    }

    /// Like `evaluate`, but returns `None` instead of queueing when a run is
    /// already in flight
    pub async fn evaluate_if_idle(&self) -> Option<ServiceResult<DecisionPayload>> {
        let Ok(_run) = self.run_gate.try_lock() else {
            debug!(symbol = %self.symbol, "Evaluation already in flight, skipping");
            return None;
        };
        Some(self.evaluate_locked().await)
    }

    async fn evaluate_locked(&self) -> ServiceResult<DecisionPayload> {
        let start = Instant::now();
        let result = self.run_once().await;
        self.metrics
            .pipeline_duration_seconds
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(payload) => {
                self.metrics.pipeline_runs_total.inc();
                self.metrics.last_confidence.set(payload.confidence);
                self.record(&payload).await;

                *self.latest.write().await = Some(payload.clone());
                if self.updates.send(payload.clone()).is_err() {
                    debug!(symbol = %self.symbol, "No live subscribers for update");
                }
                Ok(payload)
            }
            Err(e) => {
                self.metrics.pipeline_failures_total.inc();
                error!(symbol = %self.symbol, error = %e, "Signal evaluation failed");
                Err(e)
            }
        }
    }

    async fn run_once(&self) -> ServiceResult<DecisionPayload> {
        let fetched = tokio::try_join!(
            self.provider.fetch_series(&self.symbol, Timeframe::FifteenMinute),
            self.provider.fetch_series(&self.symbol, Timeframe::Hourly),
        );
        let (short_raw, long_raw) = match fetched {
            Ok(series) => {
                self.metrics.market_data_connected.set(1.0);
                series
            }
            Err(e) => {
                self.metrics.market_data_connected.set(0.0);
                return Err(e);
            }
        };

        let short = preprocess(&short_raw)?;
        let long = preprocess(&long_raw)?;
        debug!(
            symbol = %self.symbol,
            short_points = short.len(),
            long_points = long.len(),
            "Series ready"
        );

        let pipeline = self.pipeline.clone();
        let symbol = self.symbol.clone();
        let payload = tokio::task::spawn_blocking(move || pipeline.run(&symbol, &short, &long))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;

        info!(
            symbol = %self.symbol,
            signal = %payload.signal,
            current_price = payload.current_price,
            predicted_price = payload.predicted_price,
            "Signal evaluation complete"
        );
        Ok(payload)
    }

    /// Append to the logs; failures here never fail the run
    async fn record(&self, payload: &DecisionPayload) {
        let predictions = match &self.prediction_log {
            Some(log) => {
                let mut entries: Vec<PredictionEntry> = payload
                    .timeframes
                    .iter()
                    .map(|tf| {
                        PredictionEntry::new(tf.timeframe.model_label(), tf.forecast_price, None)
                    })
                    .collect();

                // Score the previous run's next-step forecast against this run's price
                let previous_step = self
                    .latest
                    .read()
                    .await
                    .as_ref()
                    .and_then(|prev| prev.predicted_prices.first().copied());
                if let Some(predicted) = previous_step {
                    entries.push(PredictionEntry::new(
                        COMBINED_MODEL_LABEL,
                        predicted,
                        Some(payload.current_price),
                    ));
                }
                Some((log.clone(), entries))
            }
            None => None,
        };
        let signal = self
            .signal_log
            .clone()
            .map(|log| (log, payload.generated_at, payload.combined()));

        if predictions.is_none() && signal.is_none() {
            return;
        }

        // File appends block, keep them off the async workers
        let written = tokio::task::spawn_blocking(move || {
            if let Some((log, entries)) = predictions {
                if let Err(e) = log.append(&entries) {
                    warn!(path = %log.path().display(), error = %e, "Failed to append prediction log");
                }
            }
            if let Some((log, generated_at, combined)) = signal {
                if let Err(e) = log.append(generated_at, &combined) {
                    warn!(path = %log.path().display(), error = %e, "Failed to append signal log");
                }
            }
        })
        .await;

        if let Err(e) = written {
            warn!(symbol = %self.symbol, error = %e, "Log writer task failed");
        }
    }

    /// Accuracy of logged forecasts that have a known actual price
    pub async fn prediction_report(&self) -> ServiceResult<PredictionReport> {
        let entries = match self.prediction_log.clone() {
            Some(log) => tokio::task::spawn_blocking(move || log.read_entries())
                .await
                .map_err(|e| ServiceError::Task(e.to_string()))??,
            None => Vec::new(),
        };
        Ok(PredictionReport {
            overall: evaluate_predictions(&entries),
            by_model: evaluate_by_model(&entries),
        })
    }
}
