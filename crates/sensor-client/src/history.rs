//! Historical reading client for InfluxDB v2
//!
//! Asks the Flux query endpoint for the last pressure sample recorded in a
//! narrow window around "30 minutes ago" and decodes the CSV response.

use crate::error::ProviderError;
use crate::sample::{PressureSample, SampleValidator};
use crate::time::parse_to_jst;
use crate::ReadingSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// InfluxDB connection and query settings
#[derive(Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Base URL, e.g. `http://influx.local:8086`
    pub url: String,
    /// API token
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    pub field: String,
    /// Window start, minutes before now
    pub window_start_minutes: u32,
    /// Window stop, minutes before now
    pub window_stop_minutes: u32,
}

impl HistoryConfig {
    /// Settings for the standard -31m..-29m window on `bme680.pressure`
    pub fn new(url: &str, token: &str, org: &str, bucket: &str) -> Self {
        Self {
            url: url.to_string(),
            token: token.to_string(),
            org: org.to_string(),
            bucket: bucket.to_string(),
            measurement: "bme680".to_string(),
            field: "pressure".to_string(),
            window_start_minutes: 31,
            window_stop_minutes: 29,
        }
    }

    /// Build the Flux query for the configured window
    pub fn flux_query(&self) -> String {
        format!(
            r#"from(bucket: "{bucket}")
  |> range(start: -{start}m, stop: -{stop}m)
  |> filter(fn: (r) => r._measurement == "{measurement}" and r._field == "{field}")
  |> last()"#,
            bucket = escape_flux(&self.bucket),
            start = self.window_start_minutes,
            stop = self.window_stop_minutes,
            measurement = escape_flux(&self.measurement),
            field = escape_flux(&self.field),
        )
    }
}

impl std::fmt::Debug for HistoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("measurement", &self.measurement)
            .field("field", &self.field)
            .field("window_start_minutes", &self.window_start_minutes)
            .field("window_stop_minutes", &self.window_stop_minutes)
            .finish()
    }
}

/// Client for the time-series store
pub struct HistoryClient {
    config: HistoryConfig,
    http: reqwest::Client,
    validator: SampleValidator,
}

impl HistoryClient {
    /// Create a new client; every request is bounded by `timeout`
    pub fn new(config: HistoryConfig, timeout: Duration) -> Result<Self, ProviderError> {
        info!(
            "Creating history client for {} (bucket {}, {}.{})",
            config.url, config.bucket, config.measurement, config.field
        );
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            config,
            http,
            validator: SampleValidator::default(),
        })
    }

    /// Replace the range validator
    pub fn with_validator(mut self, validator: SampleValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the underlying HTTP client (proxy or TLS settings)
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Fetch the sample from the configured window, if any
    pub async fn sample_in_window(&self) -> Result<Option<PressureSample>, ProviderError> {
        let endpoint = format!("{}/api/v2/query", self.config.url.trim_end_matches('/'));
        let query = self.config.flux_query();
        debug!("POST {} query={}", endpoint, query);

        let response = self
            .http
            .post(&endpoint)
            .query(&[("org", self.config.org.as_str())])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Accept", "application/csv")
            .header("Content-Type", "application/vnd.flux")
            .body(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        match parse_flux_csv(&body)? {
            Some(sample) => self.validator.validate(sample).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ReadingSource for HistoryClient {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn fetch(&self) -> Result<Option<PressureSample>, ProviderError> {
        self.sample_in_window().await
    }
}

fn escape_flux(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Decode a Flux CSV response into its first `(_time, _value)` row.
///
/// Tables are separated by blank lines and each starts with its own header
/// row. `last()` leaves one row per series, so when several series match the
/// first table wins. Annotation rows (`#datatype`, ...) are skipped. An empty
/// body means the window held no data.
pub fn parse_flux_csv(body: &str) -> Result<Option<PressureSample>, ProviderError> {
    let mut columns: Option<(usize, usize)> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            columns = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let cells: Vec<&str> = line.split(',').collect();
        let Some((time_idx, value_idx)) = columns else {
            let time_idx = cells.iter().position(|c| *c == "_time");
            let value_idx = cells.iter().position(|c| *c == "_value");
            match (time_idx, value_idx) {
                (Some(t), Some(v)) => columns = Some((t, v)),
                _ => {
                    return Err(ProviderError::Payload(format!(
                        "CSV header lacks _time/_value: {}",
                        line
                    )))
                }
            }
            continue;
        };

        let (Some(time), Some(value)) = (cells.get(time_idx), cells.get(value_idx)) else {
            return Err(ProviderError::Payload(format!("short CSV row: {}", line)));
        };
        let timestamp = parse_to_jst(time).map_err(|e| ProviderError::Timestamp {
            value: time.to_string(),
            reason: e.to_string(),
        })?;
        let pressure_hpa: f64 = value
            .trim()
            .parse()
            .map_err(|_| ProviderError::Payload(format!("non-numeric _value {:?}", value)))?;

        return Ok(Some(PressureSample {
            timestamp,
            pressure_hpa,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use chrono::Timelike;

    const SINGLE_ROW: &str = "\
,result,table,_start,_stop,_time,_value,_field,_measurement\r
,_result,0,2024-05-01T02:29:00Z,2024-05-01T02:31:00Z,2024-05-01T02:30:12Z,1009.7,pressure,bme680\r
\r
";

    fn client_for(url: &str) -> HistoryClient {
        let config = HistoryConfig::new(url, "influx-secret", "home", "sensors");
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        HistoryClient::new(config, Duration::from_secs(5))
            .unwrap()
            .with_http_client(http)
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = HistoryConfig::new("http://localhost:8086", "influx-secret", "home", "sensors");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("influx-secret"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("sensors"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "influx down").await;
        let err = client_for(&url).sample_in_window().await.unwrap_err();
        match err {
            ProviderError::HttpStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "influx down");
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_success_is_no_sample() {
        let url = serve_once("200 OK", "").await;
        assert!(client_for(&url).fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_success_body_decoded() {
        let url = serve_once("200 OK", SINGLE_ROW).await;
        let sample = client_for(&url).fetch().await.unwrap().unwrap();
        assert!((sample.pressure_hpa - 1009.7).abs() < 1e-9);
    }

    #[test]
    fn test_flux_query_window() {
        let config = HistoryConfig::new("http://localhost:8086", "t", "home", "sensors");
        let query = config.flux_query();
        assert!(query.contains(r#"from(bucket: "sensors")"#));
        assert!(query.contains("range(start: -31m, stop: -29m)"));
        assert!(query.contains(r#"r._measurement == "bme680" and r._field == "pressure""#));
        assert!(query.ends_with("|> last()"));
    }

    #[test]
    fn test_flux_query_escapes_quotes() {
        let config = HistoryConfig::new("http://localhost:8086", "t", "home", r#"a"b"#);
        assert!(config.flux_query().contains(r#"from(bucket: "a\"b")"#));
    }

    #[test]
    fn test_parse_single_row() {
        let sample = parse_flux_csv(SINGLE_ROW).unwrap().unwrap();
        assert_eq!(sample.timestamp.hour(), 11);
        assert_eq!(sample.timestamp.minute(), 30);
        assert!((sample.pressure_hpa - 1009.7).abs() < 1e-9);
    }

    #[test]
    fn test_empty_body_is_no_sample() {
        assert!(parse_flux_csv("").unwrap().is_none());
        assert!(parse_flux_csv("\r\n").unwrap().is_none());
    }

    #[test]
    fn test_header_only_is_no_sample() {
        let body = ",result,table,_start,_stop,_time,_value,_field,_measurement\n";
        assert!(parse_flux_csv(body).unwrap().is_none());
    }

    #[test]
    fn test_first_table_wins() {
        let body = "\
,result,table,_time,_value,host
,_result,0,2024-05-01T02:29:30Z,1010.0,livingroom

,result,table,_time,_value,host
,_result,1,2024-05-01T02:30:30Z,1002.0,garage
";
        let sample = parse_flux_csv(body).unwrap().unwrap();
        assert!((sample.pressure_hpa - 1010.0).abs() < 1e-9);
        assert_eq!(sample.timestamp.minute(), 29);
    }

    #[test]
    fn test_bad_row_after_first_is_ignored() {
        let body = "\
,result,table,_time,_value
,_result,0,2024-05-01T02:30:00Z,1007.5
,_result,0,not-a-time,oops
";
        let sample = parse_flux_csv(body).unwrap().unwrap();
        assert!((sample.pressure_hpa - 1007.5).abs() < 1e-9);
    }

    #[test]
    fn test_annotations_skipped() {
        let body = "\
#datatype,string,long,dateTime:RFC3339,double
#group,false,false,false,false
#default,_result,,,
,result,table,_time,_value
,,0,2024-05-01T02:30:00Z,1001.25
";
        let sample = parse_flux_csv(body).unwrap().unwrap();
        assert!((sample.pressure_hpa - 1001.25).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_value() {
        let body = ",result,table,_time,_value\n,_result,0,2024-05-01T02:30:00Z,abc\n";
        assert!(matches!(parse_flux_csv(body), Err(ProviderError::Payload(_))));
    }

    #[test]
    fn test_unexpected_header() {
        let body = "error,message\nunauthorized,bad token\n";
        assert!(parse_flux_csv(body).is_err());
    }
}
