//! Read-through cache layer over a pluggable backend.
//!
//! The cache is strictly an optimization: every backend failure is logged and
//! degrades to a miss (reads) or a no-op (invalidation), and an unconfigured
//! backend is a legal state in which every read falls through to the fetcher.
//! Correctness always rests on the authoritative store, bounded only by TTL
//! staleness when an invalidation is lost.

pub mod keys;
pub mod redis_backend;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Errors internal to the cache layer. Never escapes `CacheLayer` — callers
/// see either a cached value or the fetcher's own result.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimal contract a cache backend must provide.
///
/// Values are opaque serialized strings; TTL handling and pattern matching
/// are the backend's concern (Redis glob semantics for `keys_matching`).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64)
        -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}

/// Cache-aside wrapper carried in application state.
///
/// Constructed with an explicit backend (or none) so the fail-open behavior
/// is visible at wiring time rather than hidden in a global client.
#[derive(Clone)]
pub struct CacheLayer {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A cache layer with no backend: every read invokes the fetcher,
    /// every invalidation is a no-op.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Read-through get: returns the cached value under `key`, or invokes
    /// `fetcher`, stores its result with `ttl_seconds` expiry, and returns it.
    ///
    /// Backend and serialization failures are logged and treated as a miss;
    /// only the fetcher's own error can surface to the caller. Concurrent
    /// callers racing on a miss may each invoke the fetcher — last write
    /// wins, which is sound because they all compute from the same source.
    pub async fn get_cached<T, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        fetcher: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let Some(backend) = &self.backend else {
            return fetcher().await;
        };

        match backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!("cache hit: {key}");
                    return Ok(value);
                }
                Err(e) => {
                    // Corrupt entry: drop it and refetch.
                    warn!("cache entry for {key} failed to deserialize: {e}");
                    if let Err(e) = backend.delete(key).await {
                        warn!("failed to delete corrupt cache entry {key}: {e}");
                    }
                }
            },
            Ok(None) => debug!("cache miss: {key}"),
            Err(e) => warn!("cache get failed for {key}, falling through: {e}"),
        }

        let value = fetcher().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = backend.set_with_expiry(key, &raw, ttl_seconds).await {
                    warn!("cache set failed for {key}: {e}");
                }
            }
            Err(e) => warn!("failed to serialize cache value for {key}: {e}"),
        }

        Ok(value)
    }

    /// Deletes one exact key. Failures are logged, never surfaced — a lost
    /// invalidation degrades to a stale read until TTL expiry.
    pub async fn invalidate_key(&self, key: &str) {
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(e) = backend.delete(key).await {
            warn!("cache invalidation failed for {key}: {e}");
        }
    }

    /// Deletes every key matching a glob pattern (e.g. `streaks:*:<user_id>`).
    pub async fn invalidate_pattern(&self, pattern: &str) {
        let Some(backend) = &self.backend else {
            return;
        };
        match backend.keys_matching(pattern).await {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = backend.delete(&key).await {
                        warn!("cache invalidation failed for {key}: {e}");
                    }
                }
            }
            Err(e) => warn!("cache pattern lookup failed for {pattern}: {e}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for tests. TTLs are recorded but never enforced;
    //! tests exercise invalidation explicitly.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryBackend {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryBackend {
        pub fn insert_raw(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }
    }

    // Supports exact keys and patterns with a single `*` wildcard, which is
    // all the key builders produce.
    fn glob_matches(pattern: &str, key: &str) -> bool {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => {
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix)
                    && key.ends_with(suffix)
            }
            None => pattern == key,
        }
    }

    #[async_trait]
    impl CacheBackend for MemoryBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_with_expiry(
            &self,
            key: &str,
            value: &str,
            _ttl_seconds: u64,
        ) -> Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .keys()
                .filter(|k| glob_matches(pattern, k))
                .cloned()
                .collect())
        }
    }

    /// Backend whose every operation fails, for fail-open tests.
    pub struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn set_with_expiry(
            &self,
            _key: &str,
            _value: &str,
            _ttl_seconds: u64,
        ) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }
}
