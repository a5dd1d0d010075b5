//! Persistence of the latest snapshot with debounced auto-save

use std::time::Duration;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Slot holding the latest document snapshot
pub const STORAGE_KEY: &str = "legalpad-document";

/// Quiet period after the last change before the snapshot is written
pub const AUTO_SAVE_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded writing {bytes} bytes to `{key}`")]
    QuotaExceeded { key: String, bytes: usize },
}

/// A string key-value store, such as the browser's local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store with an optional per-value quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: FxHashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values larger than `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Default::default()
        }
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Snapshot waiting for its quiet period to end
#[derive(Debug, Clone)]
struct Pending {
    snapshot: String,
    changed_at: Duration,
}

/// Debounced writer of the latest snapshot.
///
/// Time is passed in explicitly as the duration since session start.
#[derive(Debug, Clone)]
pub struct AutoSave {
    delay: Duration,
    key: String,
    pending: Option<Pending>,
    last_saved: Option<Duration>,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(AUTO_SAVE_DELAY)
    }
}

impl AutoSave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            key: STORAGE_KEY.to_string(),
            pending: None,
            last_saved: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Record a change; supersedes any pending snapshot and restarts the window
    pub fn record(&mut self, snapshot: &str, now: Duration) {
        self.pending = Some(Pending {
            snapshot: snapshot.to_string(),
            changed_at: now,
        });
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_saved(&self) -> Option<Duration> {
        self.last_saved
    }

    /// Write the pending snapshot if its quiet period has elapsed.
    /// Returns whether a write happened.
    pub fn poll(&mut self, store: &mut dyn KeyValueStore, now: Duration) -> Result<bool, StorageError> {
        match &self.pending {
            Some(pending) if now.saturating_sub(pending.changed_at) >= self.delay => {
                self.flush(store, now)
            }
            _ => Ok(false),
        }
    }

    /// Write the pending snapshot immediately. On failure it stays pending.
    pub fn flush(&mut self, store: &mut dyn KeyValueStore, now: Duration) -> Result<bool, StorageError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        match store.set(&self.key, &pending.snapshot) {
            Ok(()) => {
                info!("auto-saved {} bytes to `{}`", pending.snapshot.len(), self.key);
                self.last_saved = Some(now);
                Ok(true)
            }
            Err(err) => {
                warn!("auto-save failed: {err}");
                self.pending = Some(pending);
                Err(err)
            }
        }
    }

    /// Read the saved snapshot, if any
    pub fn restore(&self, store: &dyn KeyValueStore) -> Result<Option<String>, StorageError> {
        let saved = store.get(&self.key)?;
        debug!(
            "restore from `{}`: {}",
            self.key,
            if saved.is_some() { "found" } else { "empty" }
        );
        Ok(saved)
    }
}
