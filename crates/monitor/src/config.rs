//! Environment-driven configuration

use crate::MonitorError;
use alerting::DetectorConfig;
use notifier::{LineConfig, DEFAULT_PUSH_URL};
use sensor_client::HistoryConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use storage::DEFAULT_COOLDOWN_FILE;

/// Monitor configuration, read from environment variables
///
/// | Variable                    | Required | Default           |
/// |-----------------------------|----------|-------------------|
/// | `BME680_URL`                | yes      |                   |
/// | `INFLUXDB_URL`              | yes      |                   |
/// | `INFLUX_TOKEN`              | yes      |                   |
/// | `INFLUX_ORG`                | yes      |                   |
/// | `INFLUX_BUCKET`             | yes      |                   |
/// | `INFLUX_MEASUREMENT`        | no       | `bme680`          |
/// | `INFLUX_FIELD`              | no       | `pressure`        |
/// | `LINE_CHANNEL_ACCESS_TOKEN` | yes      |                   |
/// | `LINE_USER_IDS`             | yes      | comma separated   |
/// | `LINE_PUSH_URL`             | no       | LINE push API     |
/// | `LAST_NOTIFY_FILE`          | no       | `last_notify.txt` |
/// | `COOLDOWN_MINUTES`          | no       | `360`             |
/// | `DROP_THRESHOLD_HPA`        | no       | `1.0`             |
/// | `HTTP_TIMEOUT_SECS`         | no       | `10`              |
#[derive(Clone, Deserialize)]
pub struct MonitorConfig {
    pub bme680_url: String,
    pub influxdb_url: String,
    pub influx_token: String,
    pub influx_org: String,
    pub influx_bucket: String,
    #[serde(default = "default_measurement")]
    pub influx_measurement: String,
    #[serde(default = "default_field")]
    pub influx_field: String,
    pub line_channel_access_token: String,
    pub line_user_ids: String,
    #[serde(default = "default_push_url")]
    pub line_push_url: String,
    #[serde(default = "default_cooldown_file")]
    pub last_notify_file: PathBuf,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    #[serde(default = "default_drop_threshold")]
    pub drop_threshold_hpa: f64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_measurement() -> String {
    "bme680".to_string()
}

fn default_field() -> String {
    "pressure".to_string()
}

fn default_push_url() -> String {
    DEFAULT_PUSH_URL.to_string()
}

fn default_cooldown_file() -> PathBuf {
    PathBuf::from(DEFAULT_COOLDOWN_FILE)
}

fn default_cooldown_minutes() -> u32 {
    DetectorConfig::default().cooldown_minutes
}

fn default_drop_threshold() -> f64 {
    DetectorConfig::default().drop_threshold_hpa
}

fn default_http_timeout() -> u64 {
    10
}

impl MonitorConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, MonitorError> {
        Self::from_source(config::Environment::default())
    }

    /// Load from any `config` source
    pub fn from_source<T>(source: T) -> Result<Self, MonitorError>
    where
        T: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder().add_source(source).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Recipient IDs, trimmed, blanks dropped
    pub fn recipients(&self) -> Vec<String> {
        self.line_user_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            drop_threshold_hpa: self.drop_threshold_hpa,
            cooldown_minutes: self.cooldown_minutes,
            ..Default::default()
        }
    }

    pub fn history_config(&self) -> HistoryConfig {
        let mut history = HistoryConfig::new(
            &self.influxdb_url,
            &self.influx_token,
            &self.influx_org,
            &self.influx_bucket,
        );
        history.measurement = self.influx_measurement.clone();
        history.field = self.influx_field.clone();
        history
    }

    pub fn line_config(&self) -> LineConfig {
        LineConfig {
            access_token: self.line_channel_access_token.clone(),
            push_url: self.line_push_url.clone(),
            timeout: self.http_timeout(),
        }
    }
}

impl std::fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("bme680_url", &self.bme680_url)
            .field("influxdb_url", &self.influxdb_url)
            .field("influx_org", &self.influx_org)
            .field("influx_bucket", &self.influx_bucket)
            .field("influx_measurement", &self.influx_measurement)
            .field("influx_field", &self.influx_field)
            .field("recipients", &self.recipients().len())
            .field("line_push_url", &self.line_push_url)
            .field("last_notify_file", &self.last_notify_file)
            .field("cooldown_minutes", &self.cooldown_minutes)
            .field("drop_threshold_hpa", &self.drop_threshold_hpa)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish_non_exhaustive()
    }
}
