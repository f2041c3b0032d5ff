//! Candle sources.
//!
//! Sources may return unvalidated data; the orchestrator validates every
//! series before simulating it. Tolerant parsing of raw rows lives here and
//! nowhere else.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use backtester::Candle;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::Target;

/// Supplies candles for a target.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the target's candles in time order. `None` or an empty series
    /// means the target has no data.
    async fn fetch(&self, target: &Target) -> anyhow::Result<Option<Vec<Candle>>>;
}

/// In-memory candle store keyed by target id.
#[derive(Debug, Default)]
pub struct MemoryCandleSource {
    candles: DashMap<String, Vec<Candle>>,
}

impl MemoryCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, target_id: impl Into<String>, candles: Vec<Candle>) {
        self.candles.insert(target_id.into(), candles);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

#[async_trait]
impl CandleSource for MemoryCandleSource {
    async fn fetch(&self, target: &Target) -> anyhow::Result<Option<Vec<Candle>>> {
        Ok(self.candles.get(&target.id).map(|entry| {
            entry
                .value()
                .iter()
                .filter(|c| target.contains(c.timestamp))
                .copied()
                .collect()
        }))
    }
}

/// Reads `<dir>/<target id>.json`, a JSON array of candle objects.
///
/// Rows missing a field or carrying a non-finite value are dropped with a
/// warning. Numeric fields may also be given as strings.
#[derive(Debug, Clone)]
pub struct JsonFileCandleSource {
    dir: PathBuf,
}

impl JsonFileCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, target_id: &str) -> anyhow::Result<PathBuf> {
        if target_id.is_empty()
            || target_id.contains(['/', '\\'])
            || target_id.starts_with('.')
        {
            bail!("invalid target id {:?}", target_id);
        }
        Ok(self.dir.join(format!("{}.json", target_id)))
    }
}

#[async_trait]
impl CandleSource for JsonFileCandleSource {
    async fn fetch(&self, target: &Target) -> anyhow::Result<Option<Vec<Candle>>> {
        let path = self.path_for(&target.id)?;
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if !exists {
            debug!(target = %target.id, path = %path.display(), "No candle file");
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let rows: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a JSON array", path.display()))?;

        let parsed: Vec<Candle> = rows.iter().filter_map(parse_row).collect();
        let dropped = rows.len() - parsed.len();
        if dropped > 0 {
            warn!(
                target = %target.id,
                dropped,
                total = rows.len(),
                "Dropped malformed candle rows"
            );
        }

        Ok(Some(
            parsed
                .into_iter()
                .filter(|c| target.contains(c.timestamp))
                .collect(),
        ))
    }
}

fn parse_row(row: &Value) -> Option<Candle> {
    let number = |key: &str| -> Option<f64> {
        let value = match row.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    };

    let timestamp = match row.get("timestamp")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    Some(Candle::new(
        timestamp,
        number("open")?,
        number("high")?,
        number("low")?,
        number("close")?,
        number("volume")?,
    ))
}
