//! File-backed cache backend: one JSON envelope per key.
//!
//! Uses wall-clock expiry so entries survive process restarts. Corrupt or
//! unreadable envelopes are removed and read as a miss.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::CacheError;

use super::CacheBackend;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    value: Value,
}

impl Envelope {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Cache backend persisting one `.json` file per key.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory the backend writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Sanitized prefix keeps filenames debuggable; the hash suffix keeps
        // distinct keys from colliding after sanitization.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(64)
            .collect();
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.dir.join(format!("{safe}-{:016x}.json", hasher.finish()))
    }

    async fn read_envelope(&self, path: &Path) -> Result<Option<Envelope>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt cache file, removing");
                let _ = tokio::fs::remove_file(path).await;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.path_for(key);
        let Some(envelope) = self.read_envelope(&path).await? else {
            return Ok(None);
        };
        if envelope.is_expired(Utc::now()) {
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Backend(format!("ttl out of range: {e}")))?;
        let envelope = Envelope {
            created_at: now,
            expires_at: now + ttl,
            value,
        };
        let bytes = serde_json::to_vec(&envelope)?;
        tokio::fs::write(self.path_for(key), bytes).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut purged = 0;
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if let Some(envelope) = self.read_envelope(&path).await? {
                if envelope.is_expired(now) {
                    let _ = tokio::fs::remove_file(&path).await;
                    purged += 1;
                }
            }
        }
        Ok(purged)
    }
}
