//! Structural validation of candle sequences.
//!
//! Validation must pass before a sequence reaches the simulator. Per-candle
//! defects and ordering defects are reported ahead of the length check so a
//! malformed series is never misreported as merely too short.

use std::collections::HashSet;

use crate::candle::Candle;
use crate::error::CandleDataError;

/// Minimum candle count for a simulation-ready sequence.
pub const MIN_CANDLES: usize = 52;

/// Validate a candle sequence against [`MIN_CANDLES`].
pub fn validate(candles: &[Candle]) -> Result<(), CandleDataError> {
    validate_with_min(candles, MIN_CANDLES)
}

/// Validate a candle sequence with a caller-chosen minimum length.
pub fn validate_with_min(candles: &[Candle], min_len: usize) -> Result<(), CandleDataError> {
    if candles.is_empty() {
        return Err(CandleDataError::InsufficientData {
            len: 0,
            required: min_len,
        });
    }

    for (index, candle) in candles.iter().enumerate() {
        check_candle(index, candle)?;
    }

    let mut seen = HashSet::with_capacity(candles.len());
    for candle in candles {
        if !seen.insert(candle.timestamp) {
            return Err(CandleDataError::DuplicateTimestamp {
                timestamp: candle.timestamp,
            });
        }
    }

    for (offset, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(CandleDataError::NonMonotonicTimestamps { index: offset + 1 });
        }
    }

    if candles.len() < min_len {
        return Err(CandleDataError::InsufficientData {
            len: candles.len(),
            required: min_len,
        });
    }

    Ok(())
}

fn check_candle(index: usize, candle: &Candle) -> Result<(), CandleDataError> {
    if !candle.is_finite() {
        return Err(CandleDataError::NonFiniteValue { index });
    }

    let prices = [candle.open, candle.high, candle.low, candle.close];
    if prices.iter().any(|p| *p < 0.0) {
        return Err(CandleDataError::NegativePrice { index });
    }
    if prices.iter().any(|p| *p == 0.0) {
        return Err(CandleDataError::ZeroPrice { index });
    }

    if candle.volume < 0.0 {
        return Err(CandleDataError::NegativeVolume { index });
    }

    if candle.high < candle.low {
        return Err(CandleDataError::HighBelowLow { index });
    }

    let in_range = |p: f64| p >= candle.low && p <= candle.high;
    if !in_range(candle.open) || !in_range(candle.close) {
        return Err(CandleDataError::OhlcInconsistent { index });
    }

    Ok(())
}
