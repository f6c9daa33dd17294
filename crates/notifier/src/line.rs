//! LINE Messaging API push client

use crate::{DeliveryReport, Notifier, NotifyError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// LINE push message endpoint
pub const DEFAULT_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

/// LINE channel configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Channel access token
    pub access_token: String,
    /// Push endpoint
    pub push_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl LineConfig {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            push_url: DEFAULT_PUSH_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConfig")
            .field("access_token", &"<redacted>")
            .field("push_url", &self.push_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Request body for a single text push
pub fn push_payload(recipient: &str, message: &str) -> serde_json::Value {
    json!({
        "to": recipient,
        "messages": [{ "type": "text", "text": message }],
    })
}

/// Push notifier for a LINE channel
pub struct LinePushNotifier {
    config: LineConfig,
    client: reqwest::Client,
}

impl LinePushNotifier {
    /// Create a new notifier
    pub fn new(config: LineConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        info!("Creating LINE push notifier for {}", config.push_url);
        Ok(Self { config, client })
    }

    async fn push(&self, recipient: &str, message: &str) -> Result<(u16, String), NotifyError> {
        let response = self
            .client
            .post(&self.config.push_url)
            .bearer_auth(&self.config.access_token)
            .json(&push_payload(recipient, message))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(NotifyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl Notifier for LinePushNotifier {
    async fn send(&self, message: &str, recipients: &[String]) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(recipients.len());

        for recipient in recipients.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            debug!("Pushing message to {}", recipient);
            let outcome = self.push(recipient, message).await;
            match &outcome {
                Ok((status, body)) => {
                    info!("Sent to {}: {} {}", recipient, status, body);
                }
                Err(e @ NotifyError::HttpStatus { .. }) => {
                    warn!("Push to {} rejected: {}", recipient, e);
                }
                Err(e) => {
                    error!("Push to {} failed: {}", recipient, e);
                }
            }
            reports.push(DeliveryReport {
                recipient: recipient.to_string(),
                outcome,
            });
        }

        reports
    }
}
