//! Collaborator traits the exploration core calls into, plus in-process
//! implementations used by hosts and tests.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Key-value persistence for JSON blobs.
/// Platform-specific implementations should provide this
pub trait Storage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a blob under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn save(&self, key: &str, value: &Value) -> Result<(), Self::Error>;

    /// Load the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error>;

    /// Delete the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be modified.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Network reachability, consulted before offering choice-bearing entries.
pub trait Connectivity {
    fn is_online(&self) -> bool;
}

/// Wall-clock source in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Error)]
pub enum MemoryStorageError {
    #[error("writes are disabled (attempted to save `{key}`)")]
    WritesDisabled { key: String },
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Shared in-memory storage. Clones see the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, Value>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save and remove fail until re-enabled.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a raw blob directly, bypassing the failure switch.
    pub fn seed(&self, key: &str, value: Value) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    type Error = MemoryStorageError;

    fn save(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoryStorageError::WritesDisabled {
                key: key.to_string(),
            });
        }
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| MemoryStorageError::Poisoned)?;
        blobs.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| MemoryStorageError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MemoryStorageError::WritesDisabled {
                key: key.to_string(),
            });
        }
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| MemoryStorageError::Poisoned)?;
        blobs.remove(key);
        Ok(())
    }
}

/// Connectivity that never drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Toggleable connectivity shared between clones.
#[derive(Debug, Clone)]
pub struct ConnectivityFlag(Arc<AtomicBool>);

impl ConnectivityFlag {
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "async")]
impl Connectivity for tokio::sync::watch::Receiver<bool> {
    fn is_online(&self) -> bool {
        *self.borrow()
    }
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Manually advanced clock shared between clones.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    #[must_use]
    pub fn starting_at(epoch_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(epoch_ms)))
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.0.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn set(&self, epoch_ms: u64) {
        self.0.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
