//! Signalcast server
//!
//! Serves the latest decision over HTTP and WebSocket, and optionally
//! re-evaluates on a cron schedule (`EVAL_INTERVAL_SECONDS`).

use dotenvy::dotenv;
use signalcast::config::{get_environment, AppConfig};
use signalcast::core::http::{start_server, AppState};
use signalcast::core::runtime::SignalService;
use signalcast::core::scheduler::EvaluationScheduler;
use signalcast::logging;
use signalcast::metrics::Metrics;
use signalcast::services::market_data::YahooChartProvider;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = AppConfig::from_env()?;
    info!("Starting Signalcast server");
    info!(environment = %get_environment(), "Environment");
    info!(symbol = %config.symbol, "Symbol");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    let metrics = Arc::new(Metrics::new()?);
    let provider = Arc::new(YahooChartProvider::new(config.market_data_url.clone()));
    let service = Arc::new(SignalService::from_config(&config, provider, metrics)?);

    let scheduler = if config.evaluation_interval_seconds > 0 {
        let scheduler = EvaluationScheduler::new(service.clone(), config.evaluation_interval_seconds)?;
        scheduler.start().await;
        Some(scheduler)
    } else {
        warn!("EVAL_INTERVAL_SECONDS is 0, evaluations run only on request");
        None
    };

    let state = AppState::new(service.clone());
    let port = config.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Warm the dashboard with a first decision
    let warmup = service.clone();
    tokio::spawn(async move {
        if let Err(e) = warmup.evaluate().await {
            warn!(error = %e, "Initial evaluation failed, waiting for the next trigger");
        }
    });

    info!("Server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    info!("Server stopped");
    Ok(())
}
