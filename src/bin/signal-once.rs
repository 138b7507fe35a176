//! One pipeline run; prints the decision payload as JSON on stdout.

use dotenvy::dotenv;
use signalcast::config::AppConfig;
use signalcast::core::runtime::SignalService;
use signalcast::logging;
use signalcast::metrics::Metrics;
use signalcast::services::market_data::YahooChartProvider;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging_to_stderr();

    let config = AppConfig::from_env()?;
    info!(symbol = %config.symbol, "Running a single evaluation");

    let metrics = Arc::new(Metrics::new()?);
    let provider = Arc::new(YahooChartProvider::new(config.market_data_url.clone()));
    let service = SignalService::from_config(&config, provider, metrics)?;

    let payload = service.evaluate().await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
