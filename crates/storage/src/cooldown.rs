//! Cooldown Store Implementations

use crate::StorageError;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Default location of the cooldown record
pub const DEFAULT_COOLDOWN_FILE: &str = "last_notify.txt";

/// Single-value store for the last notification instant.
///
/// Reads never fail: a missing, empty, unreadable or corrupt record is
/// reported as `None`, which callers treat as "never notified".
pub trait CooldownStore: Send + Sync {
    /// Last notification instant, if a valid record exists
    fn read_last_notified(&self) -> Option<DateTime<FixedOffset>>;

    /// Overwrite the record with `at`
    fn write_last_notified(&self, at: DateTime<FixedOffset>) -> Result<(), StorageError>;
}

fn parse_record(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        debug!("Cooldown record is empty");
        return None;
    }
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(at) => Some(at),
        Err(e) => {
            warn!("Ignoring corrupt cooldown record {:?}: {}", trimmed, e);
            None
        }
    }
}

/// Text file holding exactly one RFC 3339 timestamp
#[derive(Debug, Clone)]
pub struct FileCooldownStore {
    path: PathBuf,
}

impl FileCooldownStore {
    /// Create a store backed by `path`; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using cooldown file {}", path.display());
        Self { path }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl Default for FileCooldownStore {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_FILE)
    }
}

impl CooldownStore for FileCooldownStore {
    fn read_last_notified(&self) -> Option<DateTime<FixedOffset>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => parse_record(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cooldown record at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Cannot read cooldown record {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write_last_notified(&self, at: DateTime<FixedOffset>) -> Result<(), StorageError> {
        // Write beside the target and rename so readers never see a partial record.
        let tmp = self.temp_path();
        let record = at.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        fs::write(&tmp, &record).map_err(|e| self.io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        debug!("Cooldown record set to {}", record);
        Ok(())
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    last: Mutex<Option<DateTime<FixedOffset>>>,
}

impl MemoryCooldownStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `at`
    pub fn with_last_notified(at: DateTime<FixedOffset>) -> Self {
        Self {
            last: Mutex::new(Some(at)),
        }
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn read_last_notified(&self) -> Option<DateTime<FixedOffset>> {
        self.last.lock().map(|l| *l).unwrap_or(None)
    }

    fn write_last_notified(&self, at: DateTime<FixedOffset>) -> Result<(), StorageError> {
        let mut last = self
            .last
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        *last = Some(at);
        Ok(())
    }
}
