//! GPS Receiver Service - Main Entry Point

use gps_service::{init_logging, install_metrics, run_service, ServiceConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== GPS Receiver Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Receiver on {} at {} baud",
        config.device.serial_port, config.device.baud_rate
    );

    let metrics = match install_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    run_service(config, metrics).await?;

    Ok(())
}
