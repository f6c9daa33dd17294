//! Barometric Pressure Reading Providers
//!
//! This crate fetches pressure samples from the two upstream sources the
//! drop detector compares: the live BME680 sensor API and the InfluxDB
//! time series that stores its history. All instants are normalized to JST.

mod current;
mod error;
mod history;
mod sample;
pub mod time;

#[cfg(test)]
mod test_support;

pub use current::{parse_current, CurrentClient};
pub use error::ProviderError;
pub use history::{parse_flux_csv, HistoryClient, HistoryConfig};
pub use sample::{PressureSample, SampleValidator, ValidationConfig};

use async_trait::async_trait;

/// A source of a single pressure sample
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Fetch one sample; `Ok(None)` means the source had no data
    async fn fetch(&self) -> Result<Option<PressureSample>, ProviderError>;
}
