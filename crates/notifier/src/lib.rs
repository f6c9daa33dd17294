//! Push Notification Delivery
//!
//! Sends a text message to each configured recipient through the LINE
//! Messaging API push endpoint. One request per recipient; a failure for
//! one recipient never stops delivery to the rest.

mod line;

pub use line::{push_payload, LineConfig, LinePushNotifier, DEFAULT_PUSH_URL};

use async_trait::async_trait;
use thiserror::Error;

/// Notification error types
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Result of one delivery attempt
#[derive(Debug)]
pub struct DeliveryReport {
    pub recipient: String,
    /// Accepted status and response body, or why the push failed
    pub outcome: Result<(u16, String), NotifyError>,
}

impl DeliveryReport {
    /// Whether the push endpoint accepted the message
    pub fn is_delivered(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Something that can deliver a message to a set of recipients
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempt delivery to every recipient; one report per attempt
    async fn send(&self, message: &str, recipients: &[String]) -> Vec<DeliveryReport>;
}
