//! Drop Detector Implementation

use chrono::{DateTime, Duration, FixedOffset};
use sensor_client::time::local_hour;
use sensor_client::PressureSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use storage::CooldownStore;
use tracing::{debug, info, warn};

const HOURS_PER_DAY: u32 = 24;

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// A fall strictly larger than this over the window is a drop (hPa, default: 1.0)
    pub drop_threshold_hpa: f64,
    /// First night hour, JST (default: 0)
    pub night_start_hour: u32,
    /// First daytime hour after the night, JST (default: 6)
    pub night_end_hour: u32,
    /// Minimum time between two notifications (minutes, default: 360)
    pub cooldown_minutes: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            drop_threshold_hpa: 1.0,
            night_start_hour: 0,
            night_end_hour: 6,
            cooldown_minutes: 360, // 6 hours
        }
    }
}

/// Why a notification was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// One of the samples could not be obtained
    MissingData,
    /// Current sample falls in the night window
    NightHours,
    /// A notification was sent within the cooldown window
    CooldownActive,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::MissingData => "missing-data",
            SuppressReason::NightHours => "night-hours",
            SuppressReason::CooldownActive => "cooldown-active",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Suppressed(SuppressReason),
    /// Send this message
    Notify(String),
    NoChange,
}

/// Derived view of a sample pair, for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropEvaluation {
    /// current - past (hPa); negative means falling
    pub delta_hpa: f64,
    pub is_night: bool,
    pub should_notify: bool,
}

/// Notification text for a drop reaching `pressure_hpa`
pub fn notification_message(pressure_hpa: f64) -> String {
    format!(
        "気圧が急激に下がっています👇\n天気と頭痛に気をつけてね😉\n気圧:{:.1}hPa",
        pressure_hpa
    )
}

/// Drop detector backed by a cooldown store
pub struct DropDetector<S> {
    config: DetectorConfig,
    store: S,
}

impl<S: CooldownStore> DropDetector<S> {
    /// Create a new detector. Night hours above 24 are clamped to 24.
    pub fn new(mut config: DetectorConfig, store: S) -> Self {
        for hour in [&mut config.night_start_hour, &mut config.night_end_hour] {
            if *hour > HOURS_PER_DAY {
                warn!("Night hour {} out of range, clamping to {}", hour, HOURS_PER_DAY);
                *hour = HOURS_PER_DAY;
            }
        }
        info!("Creating drop detector with config: {:?}", config);
        Self { config, store }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether `at` falls in the night window (JST)
    pub fn is_night(&self, at: &DateTime<FixedOffset>) -> bool {
        let hour = local_hour(at);
        let (start, end) = (self.config.night_start_hour, self.config.night_end_hour);
        if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    fn is_drop(&self, delta_hpa: f64) -> bool {
        delta_hpa < -self.config.drop_threshold_hpa
    }

    /// Whether a notification sent earlier still blocks one at `now`
    pub fn cooldown_active(&self, now: &DateTime<FixedOffset>) -> bool {
        match self.store.read_last_notified() {
            Some(last) => {
                let elapsed = now.signed_duration_since(last);
                let active = elapsed < Duration::minutes(i64::from(self.config.cooldown_minutes));
                debug!(
                    "Last notification at {} ({} min ago), cooldown active: {}",
                    last,
                    elapsed.num_minutes(),
                    active
                );
                active
            }
            None => false,
        }
    }

    /// Summarize a sample pair; `None` when either sample is missing
    pub fn assess(
        &self,
        current: Option<PressureSample>,
        past: Option<PressureSample>,
    ) -> Option<DropEvaluation> {
        self.judge(current, past).0
    }

    /// Decide whether the change from `past` to `current` warrants a notification.
    ///
    /// Reads the cooldown store but never writes it; the caller records the
    /// notification with [`DropDetector::record_notification`] before sending.
    pub fn evaluate(&self, current: Option<PressureSample>, past: Option<PressureSample>) -> Decision {
        self.judge(current, past).1
    }

    /// Summary and decision from a single cooldown read.
    ///
    /// The store is consulted only for a daytime drop, at most once.
    pub fn judge(
        &self,
        current: Option<PressureSample>,
        past: Option<PressureSample>,
    ) -> (Option<DropEvaluation>, Decision) {
        let (Some(current), Some(past)) = (current, past) else {
            warn!(
                "Missing data (current: {}, past: {})",
                current.is_some(),
                past.is_some()
            );
            return (None, Decision::Suppressed(SuppressReason::MissingData));
        };

        let delta_hpa = current.pressure_hpa - past.pressure_hpa;
        info!("{} -> {}", past.timestamp, current.timestamp);
        info!(
            "Pressure: {} -> {} hPa (delta {:+.2} hPa)",
            past.pressure_hpa, current.pressure_hpa, delta_hpa
        );

        let is_night = self.is_night(&current.timestamp);
        let is_drop = self.is_drop(delta_hpa);
        let cooling_down = !is_night && is_drop && self.cooldown_active(&current.timestamp);

        let decision = if is_night {
            info!("Night hours, skipping notification");
            Decision::Suppressed(SuppressReason::NightHours)
        } else if !is_drop {
            info!("No significant pressure change");
            Decision::NoChange
        } else if cooling_down {
            info!(
                "Already notified within {} minutes, skipping notification",
                self.config.cooldown_minutes
            );
            Decision::Suppressed(SuppressReason::CooldownActive)
        } else {
            info!("Rapid pressure drop detected");
            Decision::Notify(notification_message(current.pressure_hpa))
        };

        let evaluation = DropEvaluation {
            delta_hpa,
            is_night,
            should_notify: matches!(decision, Decision::Notify(_)),
        };
        (Some(evaluation), decision)
    }

    /// Persist `at` as the last notification instant.
    ///
    /// A write failure is logged and swallowed: it only weakens throttling
    /// for later runs. Returns whether the write succeeded.
    pub fn record_notification(&self, at: DateTime<FixedOffset>) -> bool {
        match self.store.write_last_notified(at) {
            Ok(()) => {
                debug!("Recorded notification at {}", at);
                true
            }
            Err(e) => {
                warn!("Failed to record notification at {}: {}", at, e);
                false
            }
        }
    }
}
