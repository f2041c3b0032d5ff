//! Error types for batch runs.

use backtester::{CandleDataError, ConfigError};
use thiserror::Error;

/// Result cache fault. Callers treat every variant as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    LockPoisoned,

    #[error("failed to serialize cache key input: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a single target within a run.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("no candles found for target {target}")]
    NotFound { target: String },

    #[error("invalid candle data for target {target}: {source}")]
    InvalidData {
        target: String,
        #[source]
        source: CandleDataError,
    },

    #[error("candle fetch failed for target {target}: {source}")]
    Fetch {
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TargetError {
    /// Stable, machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            TargetError::NotFound { .. } => "not_found",
            TargetError::InvalidData { source, .. } => source.reason_code(),
            TargetError::Fetch { .. } => "fetch_failed",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            TargetError::NotFound { target }
            | TargetError::InvalidData { target, .. }
            | TargetError::Fetch { target, .. } => target,
        }
    }
}

/// Fatal run error.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("run aborted on target {target}: {0}", target = .0.target())]
    Aborted(#[source] TargetError),

    #[error("invalid scenario: {0}")]
    InvalidScenario(#[from] ConfigError),

    #[error("invalid run options: {0}")]
    InvalidOptions(String),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BatchError>;
