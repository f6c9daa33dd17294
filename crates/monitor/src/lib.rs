//! Pressure Drop Monitor
//!
//! Wires the reading providers, the drop detector, the cooldown store and the
//! push notifier together and runs one evaluation cycle.

mod config;
mod cycle;

pub use crate::config::MonitorConfig;
pub use cycle::{fetch_or_absent, CycleOutcome, Monitor};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Monitor setup errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Reading provider setup failed: {0}")]
    Provider(#[from] sensor_client::ProviderError),

    #[error("Notifier setup failed: {0}")]
    Notifier(#[from] notifier::NotifyError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging
///
/// Filtering follows `RUST_LOG` (default `info`); `LOG_FORMAT=json` switches
/// to JSON lines.
pub fn init_logging() -> Result<(), MonitorError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let result = if json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| MonitorError::Logging(e.to_string()))
}
