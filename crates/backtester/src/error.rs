//! Error types for candle validation and strategy configuration.

use thiserror::Error;

/// A candle sequence failed structural validation.
///
/// Every variant maps to a stable reason code (see [`CandleDataError::reason_code`])
/// so callers can report the specific defect instead of a generic failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandleDataError {
    #[error("candle {index} has a non-finite OHLCV value")]
    NonFiniteValue { index: usize },

    #[error("candle {index} has a negative price")]
    NegativePrice { index: usize },

    #[error("candle {index} has a zero price")]
    ZeroPrice { index: usize },

    #[error("candle {index} has negative volume")]
    NegativeVolume { index: usize },

    #[error("candle {index} has high below low")]
    HighBelowLow { index: usize },

    #[error("candle {index} has open/close outside the high/low range")]
    OhlcInconsistent { index: usize },

    #[error("duplicate timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: i64 },

    #[error("timestamps not increasing at candle {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("insufficient data: {len} candles, need at least {required}")]
    InsufficientData { len: usize, required: usize },
}

impl CandleDataError {
    /// Stable, machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            CandleDataError::NonFiniteValue { .. } => "non_finite_value",
            CandleDataError::NegativePrice { .. } => "negative_price",
            CandleDataError::ZeroPrice { .. } => "zero_price",
            CandleDataError::NegativeVolume { .. } => "negative_volume",
            CandleDataError::HighBelowLow { .. } => "high_below_low",
            CandleDataError::OhlcInconsistent { .. } => "ohlc_inconsistent",
            CandleDataError::DuplicateTimestamp { .. } => "duplicate_timestamp",
            CandleDataError::NonMonotonicTimestamps { .. } => "non_monotonic_timestamps",
            CandleDataError::InsufficientData { .. } => "insufficient_data",
        }
    }
}

/// A strategy or cost configuration value is out of range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} out of range: {message}")]
    OutOfRange {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::OutOfRange {
            field,
            message: message.into(),
        }
    }
}

/// Errors from the checked simulation entry point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid candle data ({code}): {0}", code = .0.reason_code())]
    Data(#[from] CandleDataError),

    #[error("invalid strategy configuration: {0}")]
    Config(#[from] ConfigError),
}
