//! Pressure Drop Alerting
//!
//! Decides whether a pressure change between two samples warrants a push
//! notification: night suppression, drop threshold, and a persisted cooldown.

mod detector;

pub use detector::{
    notification_message, Decision, DetectorConfig, DropDetector, DropEvaluation, SuppressReason,
};
