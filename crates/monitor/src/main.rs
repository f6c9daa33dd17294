//! Pressure Drop Monitor - Main Entry Point
//!
//! Runs a single check and exits; schedule it externally (cron, systemd timer).

use monitor::{init_logging, Monitor, MonitorConfig};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_logging()?;

    info!("=== Pressure Drop Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let monitor = Monitor::from_config(&config)?;
    let outcome = monitor.run_cycle().await;

    info!("Cycle complete: {:?}", outcome.decision);
    Ok(())
}
