//! Pressure samples and range validation

use crate::error::ProviderError;
use crate::time::to_jst;
use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// A single timestamped barometric reading, normalized to JST
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureSample {
    /// Measurement instant (JST)
    pub timestamp: DateTime<FixedOffset>,
    /// Pressure in hPa
    pub pressure_hpa: f64,
}

impl PressureSample {
    /// Create a sample, converting the instant to JST
    pub fn new<Tz: TimeZone>(timestamp: DateTime<Tz>, pressure_hpa: f64) -> Self {
        Self {
            timestamp: to_jst(&timestamp),
            pressure_hpa,
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Plausible station pressure range (hPa)
    pub pressure_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            pressure_range: (300.0, 1100.0),
        }
    }
}

/// Range checker for incoming samples
#[derive(Debug, Clone, Default)]
pub struct SampleValidator {
    config: ValidationConfig,
}

impl SampleValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Reject non-finite or implausible pressure values
    pub fn validate(&self, sample: PressureSample) -> Result<PressureSample, ProviderError> {
        let (min, max) = self.config.pressure_range;
        let value = sample.pressure_hpa;
        if !value.is_finite() || value < min || value > max {
            return Err(ProviderError::OutOfRange { value, min, max });
        }
        Ok(sample)
    }
}
