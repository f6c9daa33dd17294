//! Storage Layer
//!
//! Persists the instant of the last sent notification behind the
//! [`CooldownStore`] trait.

mod cooldown;

pub use cooldown::{CooldownStore, FileCooldownStore, MemoryCooldownStore, DEFAULT_COOLDOWN_FILE};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Lock error: {0}")]
    Lock(String),
}
