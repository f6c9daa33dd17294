//! Current reading client for the BME680 sensor API
//!
//! The sensor exposes its latest measurement as a small JSON document:
//! `{"timestamp": "2024-05-01T03:00:00Z", "pressure": 1008.4, ...}`.
//! Extra fields are ignored.

use crate::error::ProviderError;
use crate::sample::{PressureSample, SampleValidator};
use crate::time::parse_to_jst;
use crate::ReadingSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    timestamp: String,
    pressure: f64,
}

/// Client for the live sensor endpoint
pub struct CurrentClient {
    url: String,
    http: reqwest::Client,
    validator: SampleValidator,
}

impl CurrentClient {
    /// Create a new client for `url`; every request is bounded by `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        info!("Creating current reading client for {}", url);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
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

    /// Fetch the latest reading
    pub async fn latest(&self) -> Result<PressureSample, ProviderError> {
        debug!("GET {}", self.url);
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        self.validator.validate(parse_current(&body)?)
    }
}

#[async_trait]
impl ReadingSource for CurrentClient {
    fn name(&self) -> &'static str {
        "current"
    }

    async fn fetch(&self) -> Result<Option<PressureSample>, ProviderError> {
        self.latest().await.map(Some)
    }
}

/// Decode a sensor API response body
pub fn parse_current(body: &str) -> Result<PressureSample, ProviderError> {
    let payload: CurrentPayload = serde_json::from_str(body)?;
    let timestamp = parse_to_jst(&payload.timestamp).map_err(|e| ProviderError::Timestamp {
        value: payload.timestamp.clone(),
        reason: e.to_string(),
    })?;
    Ok(PressureSample {
        timestamp,
        pressure_hpa: payload.pressure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;
    use chrono::Timelike;

    fn client_for(url: &str) -> CurrentClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        CurrentClient::new(url, Duration::from_secs(5))
            .unwrap()
            .with_http_client(http)
    }

    #[test]
    fn test_parse_utc_payload() {
        let body = r#"{"timestamp": "2024-05-01T03:00:00Z", "pressure": 1008.42, "humidity": 51.0}"#;
        let sample = parse_current(body).unwrap();
        assert_eq!(sample.timestamp.hour(), 12);
        assert!((sample.pressure_hpa - 1008.42).abs() < 1e-9);
    }

    #[test]
    fn test_parse_offset_payload() {
        let body = r#"{"timestamp": "2024-05-01T12:00:00+09:00", "pressure": 1000}"#;
        let sample = parse_current(body).unwrap();
        assert_eq!(sample.timestamp.to_rfc3339(), "2024-05-01T12:00:00+09:00");
    }

    #[test]
    fn test_missing_pressure_is_payload_error() {
        let body = r#"{"timestamp": "2024-05-01T03:00:00Z"}"#;
        assert!(matches!(parse_current(body), Err(ProviderError::Payload(_))));
    }

    #[test]
    fn test_null_pressure_is_payload_error() {
        let body = r#"{"timestamp": "2024-05-01T03:00:00Z", "pressure": null}"#;
        assert!(matches!(parse_current(body), Err(ProviderError::Payload(_))));
    }

    #[test]
    fn test_bad_timestamp() {
        let body = r#"{"timestamp": "01/05/2024 03:00", "pressure": 1008.0}"#;
        assert!(matches!(parse_current(body), Err(ProviderError::Timestamp { .. })));
    }

    #[test]
    fn test_not_json() {
        assert!(parse_current("<html>502 Bad Gateway</html>").is_err());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "sensor offline").await;
        let err = client_for(&url).latest().await.unwrap_err();
        assert!(matches!(err, ProviderError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_success_payload_decoded() {
        let url = serve_once(
            "200 OK",
            r#"{"timestamp": "2024-05-01T03:00:00Z", "pressure": 1004.6}"#,
        )
        .await;
        let sample = client_for(&url).fetch().await.unwrap().unwrap();
        assert_eq!(sample.timestamp.hour(), 12);
        assert!((sample.pressure_hpa - 1004.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_implausible_pressure_rejected() {
        let url = serve_once(
            "200 OK",
            r#"{"timestamp": "2024-05-01T03:00:00Z", "pressure": 12.0}"#,
        )
        .await;
        let err = client_for(&url).latest().await.unwrap_err();
        assert!(matches!(err, ProviderError::OutOfRange { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let client = CurrentClient::new("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();
        assert!(client.fetch().await.is_err());
    }
}
