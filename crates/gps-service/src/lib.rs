//! GPS Receiver Service
//!
//! Runs the consumer tick scheduler for a serial GPS receiver and serves the
//! published position over a small read-only JSON API.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use gps_device::{DeviceState, GpsDevice};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod routes;
mod scheduler;

pub use config::{ServiceConfig, CONFIG_PATH_ENV};
pub use error::ServiceError;
pub use routes::gps::GpsResponse;
pub use routes::position::PositionResponse;
pub use scheduler::{run_scheduler, SchedulerConfig, SchedulerStats};

/// Application state shared across handlers
pub struct AppState {
    /// Receiver pipeline
    pub device: Arc<GpsDevice>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus render handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(device: Arc<GpsDevice>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            device,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub device_state: DeviceState,
    pub fix_valid: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/position", get(routes::position::get_position))
        .route("/api/v1/gps", get(routes::gps::get_gps))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let device_state = state.device.state();
    let status = match device_state {
        DeviceState::Running => "healthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        device_state,
        fix_valid: state.device.position_estimate().valid,
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, json: bool) -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ServiceError::Logging(e.to_string()))?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ServiceError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder and describe the pipeline metrics
pub fn install_metrics() -> Result<PrometheusHandle, ServiceError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServiceError::Metrics(e.to_string()))?;

    metrics::describe_counter!(
        "gps_bytes_read_total",
        metrics::Unit::Bytes,
        "Bytes read from the serial link"
    );
    metrics::describe_counter!("gps_ticks_processed_total", "Ticks that drained the ring");
    metrics::describe_counter!("gps_sentences_decoded_total", "NMEA sentences decoded");
    metrics::describe_counter!(
        "gps_sentences_rejected_total",
        "NMEA sentences dropped for checksum, format, or truncation"
    );
    metrics::describe_counter!(
        "gps_line_endings_repaired_total",
        "Bare line feeds given a carriage return"
    );
    metrics::describe_gauge!("gps_ring_fill_ratio", "Byte ring occupancy at the last status check");

    Ok(handle)
}

/// Run the service until Ctrl-C
pub async fn run_service(
    config: ServiceConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<(), ServiceError> {
    let device = Arc::new(GpsDevice::new(config.device.clone()));

    // A missing receiver is not fatal; the API reports the device as stopped
    if let Err(e) = device.start() {
        warn!("GPS device not started: {}", e);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = tokio::spawn(run_scheduler(
        device.clone(),
        SchedulerConfig {
            idle_interval: config.idle_interval(),
            status_interval: config.status_interval(),
        },
        shutdown_rx.clone(),
    ));

    let app = create_router(Arc::new(AppState::new(device.clone(), metrics)));
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!("GPS API listening on {}", config.http_addr);

    let mut server_shutdown = shutdown_rx;
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    match scheduler.await {
        Ok(stats) => info!(
            "Scheduler ran {} ticks, {} with data",
            stats.ticks, stats.processed
        ),
        Err(e) => error!("Scheduler task failed: {}", e),
    }

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("API server error: {}", e),
        Err(e) => error!("API server task failed: {}", e),
    }

    stop_device(device, config.shutdown_timeout()).await;
    Ok(())
}

/// Stop the device off the runtime. The reader can stay parked in a read
/// until the receiver talks, so the wait is bounded.
async fn stop_device(device: Arc<GpsDevice>, timeout: Duration) {
    let (done_tx, done_rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("gps-stop".to_string())
        .spawn(move || {
            device.stop();
            let _ = done_tx.send(());
        });

    if let Err(e) = spawned {
        error!("Failed to spawn stop thread: {}", e);
        return;
    }

    match tokio::time::timeout(timeout, done_rx).await {
        Ok(_) => info!("GPS device stopped"),
        Err(_) => warn!(
            "GPS reader still blocked after {:?}; exiting without join",
            timeout
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use gps_device::DeviceConfig;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let device = Arc::new(GpsDevice::new(DeviceConfig {
            serial_port: "/dev/does-not-exist-gps".to_string(),
            ..Default::default()
        }));
        Arc::new(AppState::new(device, None))
    }

    #[tokio::test]
    async fn test_health_reports_stopped_device() {
        let Json(health) = health_handler(State(test_state())).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.device_state, DeviceState::Stopped);
        assert!(!health.fix_valid);
    }

    #[tokio::test]
    async fn test_position_defaults_to_invalid() {
        let Json(position) = routes::position::get_position(State(test_state())).await;
        assert!(!position.valid);
        assert_eq!(position.latitude, 0.0);
        assert_eq!(position.utc_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_gps_route_serves_json() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/gps").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["state"], "Stopped");
        assert_eq!(json["serial_port"], "/dev/does-not-exist-gps");
        assert_eq!(json["baud_rate"], 4800);
        assert_eq!(json["snapshot"]["satellite_count"], 0);
        assert_eq!(json["bytes_received"], 0);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stop_device_when_never_started() {
        let device = test_state().device.clone();
        stop_device(device.clone(), Duration::from_secs(1)).await;
        assert_eq!(device.state(), DeviceState::Stopped);
    }
}
