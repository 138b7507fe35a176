//! Prometheus metrics for the HTTP surface and pipeline runs

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: Counter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: Gauge,
    pub pipeline_runs_total: Counter,
    pub pipeline_failures_total: Counter,
    pub pipeline_duration_seconds: Histogram,
    /// Confidence of the most recent successful run
    pub last_confidence: Gauge,
    pub market_data_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            Counter::with_opts(Opts::new("http_requests_total", "Total HTTP requests"))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = Gauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let pipeline_runs_total = Counter::with_opts(Opts::new(
            "pipeline_runs_total",
            "Completed signal pipeline runs",
        ))?;
        let pipeline_failures_total = Counter::with_opts(Opts::new(
            "pipeline_failures_total",
            "Signal pipeline runs that produced no payload",
        ))?;
        let pipeline_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "pipeline_duration_seconds",
                "Wall time of one evaluation, fetch included",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        let last_confidence = Gauge::with_opts(Opts::new(
            "last_confidence",
            "Combined confidence of the latest decision (0-100)",
        ))?;
        let market_data_connected = Gauge::with_opts(Opts::new(
            "market_data_connected",
            "1 when the last market data fetch succeeded",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(pipeline_runs_total.clone()))?;
        registry.register(Box::new(pipeline_failures_total.clone()))?;
        registry.register(Box::new(pipeline_duration_seconds.clone()))?;
        registry.register(Box::new(last_confidence.clone()))?;
        registry.register(Box::new(market_data_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            pipeline_runs_total,
            pipeline_failures_total,
            pipeline_duration_seconds,
            last_confidence,
            market_data_connected,
        })
    }

    /// Text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
