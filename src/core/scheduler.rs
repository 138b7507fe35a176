//! Cron-based scheduler for periodic signal evaluation

use crate::core::runtime::SignalService;
use crate::error::ServiceError;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Build a six-field cron expression firing every `interval_seconds`
pub fn cron_expression(interval_seconds: u64) -> String {
    if interval_seconds >= 60 {
        format!("0 */{} * * * *", interval_seconds / 60)
    } else {
        format!("*/{} * * * * *", interval_seconds)
    }
}

/// Runs `SignalService::evaluate` on a cron schedule
pub struct EvaluationScheduler {
    service: Arc<SignalService>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl EvaluationScheduler {
    /// `interval_seconds` of 0 disables the scheduler and is rejected
    pub fn new(service: Arc<SignalService>, interval_seconds: u64) -> Result<Self, ServiceError> {
        if interval_seconds == 0 {
            return Err(ServiceError::Scheduler(
                "scheduler disabled: interval_seconds is 0".to_string(),
            ));
        }

        let cron_expr = cron_expression(interval_seconds);
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            ServiceError::Scheduler(format!("invalid cron expression '{}': {}", cron_expr, e))
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            symbol = %service.symbol(),
            "EvaluationScheduler: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            service,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) {
        let service = self.service.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("EvaluationScheduler: started, waiting for cron schedule...");

            loop {
                match schedule.upcoming(chrono::Utc).next() {
                    Some(next_tick) => {
                        let wait = (next_tick - chrono::Utc::now()).to_std().unwrap_or_default();
                        tokio::time::sleep(wait).await;
                    }
                    None => {
                        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                        continue;
                    }
                }

                info!(symbol = %service.symbol(), "EvaluationScheduler: cron tick");
                if let Err(e) = service.evaluate().await {
                    warn!(
                        symbol = %service.symbol(),
                        error = %e,
                        "EvaluationScheduler: evaluation failed, keeping previous decision"
                    );
                }
            }
        });

        *self.handle.write().await = Some(handle);
        info!("EvaluationScheduler: started successfully");
    }

    pub async fn stop(&self) {
        if let Some(h) = self.handle.write().await.take() {
            h.abort();
            info!("EvaluationScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
