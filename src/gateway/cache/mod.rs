//! Key/value cache with per-entry expiry behind a pluggable backend.
//!
//! Callers never depend on backend identity: everything goes through
//! [`CacheStore`], which also absorbs backend errors (any cache failure
//! reads as a miss) and keeps hit/miss counters.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::CacheError;

/// Storage backend abstraction.
///
/// Implementations own their expiry bookkeeping: an expired entry must
/// read as absent (and may be purged on the spot), never as an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store a value with the given time-to-live. Last writer wins.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry; returns true if something was removed.
    async fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Proactively drop expired entries; returns how many were purged.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

/// Which backend a [`CacheStore`] is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    File,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Maximum entries held by the memory backend before eviction.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Directory for the file backend; defaults to the platform cache dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

const fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            max_entries: default_max_entries(),
            dir: None,
        }
    }
}

/// Hit/miss/set counters, snapshot via [`CacheStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

/// Uniform cache interface over any [`CacheBackend`].
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl CacheStore {
    /// Build a store from config, constructing the configured backend.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new(config.max_entries)),
            CacheBackendKind::File => {
                let dir = match &config.dir {
                    Some(dir) => dir.clone(),
                    None => dirs::cache_dir()
                        .ok_or_else(|| {
                            CacheError::Backend("no platform cache directory available".into())
                        })?
                        .join("nichelord"),
                };
                Arc::new(FileBackend::new(dir)?)
            }
        };
        Ok(Self::with_backend(backend))
    }

    /// Build a store over a caller-supplied backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    /// Look up a raw value. Backend errors read as a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let value = self.lookup(key).await;
        self.count(value.is_some());
        value
    }

    /// Look up and deserialize a value. A payload that no longer matches
    /// the expected shape is dropped and reads as a miss.
    pub async fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(value) = self.lookup(key).await else {
            self.count(false);
            return None;
        };
        match serde_json::from_value(value) {
            Ok(typed) => {
                self.count(true);
                Some(typed)
            }
            Err(error) => {
                warn!(key, %error, "cached payload no longer deserializes, dropping");
                let _ = self.backend.remove(key).await;
                self.count(false);
                None
            }
        }
    }

    /// Store a raw value. Backend errors are logged and swallowed.
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if let Err(error) = self.backend.set(key, value, ttl).await {
            warn!(key, %error, "cache set failed");
        }
    }

    /// Serialize and store a value.
    pub async fn set_typed<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json, ttl).await,
            Err(error) => warn!(key, %error, "cache payload serialization failed"),
        }
    }

    /// Remove an entry.
    pub async fn remove(&self, key: &str) -> bool {
        match self.backend.remove(key).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(key, %error, "cache remove failed");
                false
            }
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        if let Err(error) = self.backend.clear().await {
            warn!(%error, "cache clear failed");
        }
    }

    /// Proactively purge expired entries; returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        match self.backend.purge_expired().await {
            Ok(purged) => purged,
            Err(error) => {
                warn!(%error, "cache purge failed");
                0
            }
        }
    }

    /// Snapshot the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }

    async fn lookup(&self, key: &str) -> Option<Value> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "cache get failed, treating as miss");
                None
            }
        }
    }

    fn count(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
