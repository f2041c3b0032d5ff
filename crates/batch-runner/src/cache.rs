//! Content-addressed cache of simulation results.
//!
//! Keys are fingerprints of the strategy configuration plus the target and
//! time range. Entries expire lazily on read after the configured TTL and
//! the oldest-inserted entry is evicted when a new key arrives at capacity.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use backtester::SimulationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::CacheError;

/// Cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub len: usize,
}

struct CacheEntry {
    result: SimulationResult,
    inserted_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order.
    order: VecDeque<String>,
    stats: CacheStats,
}

impl CacheInner {
    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// TTL and capacity bounded result cache.
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    /// Create an empty cache from settings.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.ttl(), config.capacity)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            ttl,
            capacity,
        }
    }

    /// Fingerprint a configuration together with the target identity and
    /// time range.
    ///
    /// The configuration is serialized with object keys sorted at every
    /// level, so field order never changes the key.
    pub fn generate_key<T: Serialize>(
        config: &T,
        target_id: &str,
        range_start: Option<i64>,
        range_end: Option<i64>,
        candle_count: usize,
    ) -> Result<String, CacheError> {
        let canonical = canonicalize(serde_json::to_value(config)?);
        let config_hash = sha256_hex(serde_json::to_string(&canonical)?.as_bytes());

        let bound = |ts: Option<i64>| ts.map_or_else(|| "-".to_string(), |t| t.to_string());
        let identity = format!(
            "{}|{}|{}|{}",
            target_id,
            bound(range_start),
            bound(range_end),
            candle_count
        );
        let target_hash = sha256_hex(identity.as_bytes());

        Ok(format!("{}:{}", config_hash, target_hash))
    }

    /// Look up a result, surfacing cache faults.
    pub fn try_get(&self, key: &str) -> Result<Option<SimulationResult>, CacheError> {
        let mut inner = self.inner.lock().map_err(|_| CacheError::LockPoisoned)?;

        let expired = match inner.entries.get(key) {
            None => {
                inner.stats.misses += 1;
                return Ok(None);
            }
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
        };

        if expired {
            inner.remove(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            debug!(key, "Cache entry expired");
            return Ok(None);
        }

        inner.stats.hits += 1;
        Ok(inner.entries.get(key).map(|entry| entry.result.clone()))
    }

    /// Look up a result; faults are logged and reported as a miss.
    pub fn get(&self, key: &str) -> Option<SimulationResult> {
        match self.try_get(key) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a result, surfacing cache faults.
    ///
    /// Overwriting an existing key keeps its position in the eviction order.
    pub fn try_set(&self, key: &str, result: SimulationResult) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut inner = self.inner.lock().map_err(|_| CacheError::LockPoisoned)?;

        if let Some(entry) = inner.entries.get_mut(key) {
            entry.result = result;
            entry.inserted_at = Instant::now();
            return Ok(());
        }

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.stats.evictions += 1;
            debug!(key = %oldest, "Evicted oldest cache entry");
        }

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key.to_string());
        Ok(())
    }

    /// Store a result; faults are logged and dropped.
    pub fn set(&self, key: &str, result: SimulationResult) {
        if let Err(e) = self.try_set(key, result) {
            warn!(error = %e, "Cache write failed");
        }
    }

    pub fn clear(&self) {
        match self.inner.lock() {
            Ok(mut inner) => {
                inner.entries.clear();
                inner.order.clear();
            }
            Err(_) => warn!("Cache lock poisoned, clear skipped"),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|inner| CacheStats {
                len: inner.entries.len(),
                ..inner.stats
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Rebuild a JSON value with object keys sorted at every level.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
