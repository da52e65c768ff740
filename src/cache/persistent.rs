//! Two-tier (memory + durable storage) cache of fetched translation bundles.
//!
//! # Storage layout
//!
//! Each bundle is stored under `prefix + hash(url)` as the JSON envelope
//! `{"url": ..., "timestamp": <epoch ms>, "data": {...}}`. The hash is short and
//! not collision-free, so the envelope keeps the full URL and a mismatch is
//! reported as a miss without touching the occupant.
//!
//! # Failure modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | No storage backend | Memory tier only |
//! | Corrupt entry | Deleted, reported as miss |
//! | Expired entry | Deleted, reported as miss |
//! | Write fails (quota) | Cleanup pass, one retry, then memory tier only |

use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::cache::storage::{
    KeyValueStorage,
    open_storage,
};
use crate::config::PersistentCacheConfig;
use crate::tree::TranslationTree;

/// Stored form of one cached bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEnvelope {
    url: String,
    /// Milliseconds since the Unix epoch at write time.
    timestamp: i64,
    data: TranslationTree,
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Fast, deterministic, non-cryptographic hash of a URL, rendered in base 36.
///
/// Classic `hash * 31 + unit` over UTF-16 code units with 32-bit wrapping.
#[must_use]
pub fn hash_url(url: &str) -> String {
    let hash = url
        .encode_utf16()
        .fold(0_i32, |hash, unit| hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit)));
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = DIGITS.get((value % 36) as usize).copied().unwrap_or(b'0');
        out.push(digit);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Cache of whole translation bundles keyed by source URL.
#[derive(Debug)]
pub struct PersistentBundleCache {
    storage: Option<Arc<dyn KeyValueStorage>>,
    /// Storage key -> envelope, mirrors the durable tier for this process.
    memory: Mutex<HashMap<String, CacheEnvelope>>,
    prefix: String,
    max_entries: usize,
    ttl_ms: i64,
}

impl PersistentBundleCache {
    /// Opens the storage backend named by `config`.
    #[must_use]
    pub fn from_config(config: &PersistentCacheConfig) -> Self {
        let storage = open_storage(config.storage, config.directory.as_deref());
        Self::new(config, storage)
    }

    /// Builds a cache over an explicit backend (`None` = memory tier only).
    #[must_use]
    pub fn new(config: &PersistentCacheConfig, storage: Option<Arc<dyn KeyValueStorage>>) -> Self {
        if storage.is_none() {
            tracing::debug!("No durable storage available; bundle cache is memory-only");
        }
        Self {
            storage,
            memory: Mutex::new(HashMap::new()),
            prefix: config.prefix.clone(),
            max_entries: config.max_entries,
            ttl_ms: i64::try_from(config.ttl).unwrap_or(i64::MAX),
        }
    }

    /// Storage key used for `url`.
    #[must_use]
    pub fn storage_key(&self, url: &str) -> String {
        format!("{}{}", self.prefix, hash_url(url))
    }

    /// Whether a durable backend is attached.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.storage.is_some()
    }

    pub fn get(&self, url: &str) -> Option<TranslationTree> {
        self.get_at(url, now_millis())
    }

    pub fn set(&self, url: &str, data: &TranslationTree) {
        self.set_at(url, data, now_millis());
    }

    /// Runs the cleanup pass, returning the number of deleted entries.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(now_millis())
    }

    const fn is_expired(&self, timestamp: i64, now: i64) -> bool {
        now.saturating_sub(timestamp) > self.ttl_ms
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEnvelope>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `url` as of time `now`.
    pub fn get_at(&self, url: &str, now: i64) -> Option<TranslationTree> {
        let key = self.storage_key(url);

        {
            let mut memory = self.memory();
            if let Some(envelope) = memory.get(&key) {
                if envelope.url != url {
                    tracing::debug!(url, key = %key, "Bundle cache key collision");
                    return None;
                }
                if !self.is_expired(envelope.timestamp, now) {
                    return Some(envelope.data.clone());
                }
                memory.remove(&key);
            }
        }

        let envelope = self.read_durable(&key, url, now)?;
        let data = envelope.data.clone();
        self.memory().insert(key, envelope);
        Some(data)
    }

    /// Reads and validates the durable entry for `key`.
    fn read_durable(&self, key: &str, url: &str, now: i64) -> Option<CacheEnvelope> {
        let storage = self.storage.as_ref()?;

        let raw = match storage.get(key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(key, %error, "Failed to read bundle cache entry");
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(key, %error, "Removing corrupt bundle cache entry");
                self.remove_durable(key);
                return None;
            }
        };

        if self.is_expired(envelope.timestamp, now) {
            tracing::debug!(key, "Removing expired bundle cache entry");
            self.remove_durable(key);
            return None;
        }

        if envelope.url != url {
            tracing::debug!(url, key, stored = %envelope.url, "Bundle cache key collision");
            return None;
        }

        Some(envelope)
    }

    /// Stores `data` for `url` with timestamp `now`.
    ///
    /// The memory tier always keeps the bundle. A failed durable write triggers
    /// one cleanup pass and one retry; a second failure is logged and dropped.
    pub fn set_at(&self, url: &str, data: &TranslationTree, now: i64) {
        let key = self.storage_key(url);
        let envelope = CacheEnvelope { url: url.to_string(), timestamp: now, data: data.clone() };

        if let Some(storage) = &self.storage {
            match serde_json::to_string(&envelope) {
                Ok(serialized) => self.write_durable(storage.as_ref(), &key, &serialized, now),
                Err(error) => tracing::warn!(url, %error, "Failed to serialize bundle"),
            }
        }

        self.memory().insert(key, envelope);
    }

    fn write_durable(&self, storage: &dyn KeyValueStorage, key: &str, serialized: &str, now: i64) {
        if let Err(error) = storage.set(key, serialized) {
            tracing::warn!(key, %error, "Bundle cache write failed; cleaning up and retrying");
            self.cleanup_at(now);
            if let Err(error) = storage.set(key, serialized) {
                tracing::warn!(key, %error, "Bundle cache write failed again; keeping bundle in memory only");
                return;
            }
        }

        if self.prefixed_keys(storage).len() > self.max_entries {
            self.cleanup_keeping(now, Some(key));
        }
    }

    /// Deletes corrupt and expired entries, then the oldest entries beyond
    /// `max_entries`. Returns the number of deleted entries.
    pub fn cleanup_at(&self, now: i64) -> usize {
        self.cleanup_keeping(now, None)
    }

    /// Among entries with equal timestamps, `keep` is evicted last.
    fn cleanup_keeping(&self, now: i64, keep: Option<&str>) -> usize {
        let Some(storage) = &self.storage else {
            return 0;
        };

        let mut removed = 0;
        let mut live: Vec<(String, i64)> = Vec::new();

        for key in self.prefixed_keys(storage.as_ref()) {
            let raw = match storage.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(key = %key, %error, "Failed to read bundle cache entry during cleanup");
                    continue;
                }
            };

            match serde_json::from_str::<CacheEnvelope>(&raw) {
                Ok(envelope) if !self.is_expired(envelope.timestamp, now) => {
                    live.push((key, envelope.timestamp));
                }
                Ok(_) => {
                    self.remove_durable(&key);
                    removed += 1;
                }
                Err(error) => {
                    tracing::debug!(key = %key, %error, "Removing corrupt bundle cache entry");
                    self.remove_durable(&key);
                    removed += 1;
                }
            }
        }

        if live.len() > self.max_entries {
            live.sort_by_key(|(key, timestamp)| (*timestamp, Some(key.as_str()) == keep));
            let excess = live.len() - self.max_entries;
            for (key, _) in live.iter().take(excess) {
                self.remove_durable(key);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "Bundle cache cleanup finished");
        }
        removed
    }

    /// Removes every entry under the prefix and empties the memory tier.
    pub fn clear(&self) {
        self.memory().clear();
        let Some(storage) = &self.storage else {
            return;
        };
        for key in self.prefixed_keys(storage.as_ref()) {
            if let Err(error) = storage.remove(&key) {
                tracing::warn!(key = %key, %error, "Failed to remove bundle cache entry");
            }
        }
    }

    /// Number of durable entries under the prefix.
    #[must_use]
    pub fn durable_len(&self) -> usize {
        self.storage.as_ref().map_or(0, |storage| self.prefixed_keys(storage.as_ref()).len())
    }

    fn prefixed_keys(&self, storage: &dyn KeyValueStorage) -> Vec<String> {
        storage.keys().into_iter().filter(|key| key.starts_with(&self.prefix)).collect()
    }

    /// Removes `key` from both tiers.
    fn remove_durable(&self, key: &str) {
        self.memory().remove(key);
        if let Some(storage) = &self.storage
            && let Err(error) = storage.remove(key)
        {
            tracing::warn!(key, %error, "Failed to remove bundle cache entry");
        }
    }
}
