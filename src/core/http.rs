//! HTTP and WebSocket delivery using Axum

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, warn, Level};

use crate::core::runtime::SignalService;
use crate::error::ServiceError;
use crate::metrics::Metrics;
use crate::models::payload::DecisionPayload;

pub const SERVICE_NAME: &str = "signalcast";
pub const UPDATE_EVENT: &str = "update_chart";
pub const REQUEST_EVENT: &str = "request_data";

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub service: Arc<SignalService>,
}

impl AppState {
    pub fn new(service: Arc<SignalService>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: service.metrics(),
            start_time: Arc::new(Instant::now()),
            service,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// JSON error body with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::MarketData(_) | ServiceError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": SERVICE_NAME
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Run the pipeline now and return the payload
async fn evaluate_signal(
    State(state): State<AppState>,
) -> Result<Json<DecisionPayload>, ApiError> {
    let payload = state.service.evaluate().await?;
    Ok(Json(payload))
}

async fn latest_signal(State(state): State<AppState>) -> Result<Json<DecisionPayload>, ApiError> {
    state
        .service
        .latest()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no decision has been produced yet"))
}

async fn prediction_metrics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.service.prediction_report().await?;
    Ok(Json(json!(report)))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// `update_chart` frame as pushed to dashboard clients
pub fn update_frame(payload: &DecisionPayload) -> Value {
    json!({ "event": UPDATE_EVENT, "data": payload })
}

/// Accepts the bare event name or `{"event": "request_data"}`
pub fn is_data_request(text: &str) -> bool {
    let text = text.trim();
    if text == REQUEST_EVENT {
        return true;
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("event").and_then(Value::as_str).map(|e| e == REQUEST_EVENT))
        .unwrap_or(false)
}

async fn send_update(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: &DecisionPayload,
) -> Result<(), axum::Error> {
    let frame = update_frame(payload).to_string();
    sender.send(Message::Text(frame.into())).await
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.service.subscribe();
    info!("WebSocket client connected");

    if let Some(payload) = state.service.latest().await {
        if send_update(&mut sender, &payload).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(payload) => {
                    if send_update(&mut sender, &payload).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, dropped updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) if is_data_request(text.as_str()) => {
                    debug!("WebSocket client requested data");
                    let service = state.service.clone();
                    // Result reaches every client through the broadcast channel;
                    // requests made while a run is in flight are dropped
                    tokio::spawn(async move {
                        let _ = service.evaluate_if_idle().await;
                    });
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("WebSocket client disconnected");
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/signal/evaluate", post(evaluate_signal))
        .route("/api/signal/latest", get(latest_signal))
        .route("/api/predictions/metrics", get(prediction_metrics))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
