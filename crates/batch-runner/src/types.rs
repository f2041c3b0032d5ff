//! Targets, scenarios and per-target run contexts.

use backtester::{ExtremaConfig, PeriodExtremaResult, SimulationResult, StrategyConfig, MIN_CANDLES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One instrument to simulate, optionally restricted to a time range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    /// Inclusive range start, unix seconds.
    #[serde(default)]
    pub range_start: Option<i64>,
    /// Exclusive range end, unix seconds.
    #[serde(default)]
    pub range_end: Option<i64>,
}

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            range_start: None,
            range_end: None,
        }
    }

    pub fn with_range(mut self, start: i64, end: i64) -> Self {
        self.range_start = Some(start);
        self.range_end = Some(end);
        self
    }

    /// True when `timestamp` falls inside the target's range.
    pub fn contains(&self, timestamp: i64) -> bool {
        self.range_start.map_or(true, |start| timestamp >= start)
            && self.range_end.map_or(true, |end| timestamp < end)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::new(id)
    }
}

/// A named strategy run over many targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub extrema: ExtremaConfig,
    /// Minimum candles a target needs to be simulated.
    #[serde(default = "default_min_candles")]
    pub min_candles: usize,
}

fn default_min_candles() -> usize {
    MIN_CANDLES
}

impl Scenario {
    pub fn new(name: impl Into<String>, strategy: StrategyConfig) -> Self {
        Self {
            name: name.into(),
            strategy,
            extrema: ExtremaConfig::default(),
            min_candles: MIN_CANDLES,
        }
    }

    pub fn with_extrema(mut self, extrema: ExtremaConfig) -> Self {
        self.extrema = extrema;
        self
    }

    pub fn with_min_candles(mut self, min_candles: usize) -> Self {
        self.min_candles = min_candles;
        self
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario::new("default", StrategyConfig::default())
    }
}

/// Everything known about one completed target, handed to result sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub scenario: String,
    pub target: Target,
    pub result: SimulationResult,
    pub extrema: Option<PeriodExtremaResult>,
    /// The result came from the cache.
    pub cache_hit: bool,
    pub candle_count: usize,
    pub completed_at: DateTime<Utc>,
}
