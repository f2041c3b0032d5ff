//! Period extrema analysis after an entry.
//!
//! Given an entry price and time, scans the following candles (optionally up
//! to an exclusive period end) for the period high, the low before that high,
//! the deepest drawdown after it, and drawdown/recovery pairs that would have
//! offered a re-entry.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::candle::Candle;

/// ATH multiples above this are treated as corrupted data.
pub const MAX_ATH_MULTIPLE: f64 = 10_000.0;

/// Opportunities whose drawdowns fall within this many seconds of an
/// earlier one are dropped.
const DEDUP_WINDOW_SECS: i64 = 3600;

const SECONDS_PER_DAY: i64 = 86_400;

/// Scenario-level switch and thresholds for extrema analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaConfig {
    pub enabled: bool,
    /// Analysis window length after entry; unbounded when unset.
    pub period_days: Option<u32>,
    /// Minimum decline from the ATH, in percent, for a drawdown candidate.
    pub min_drawdown_pct: f64,
    /// Minimum rise from the drawdown, in percent, for a recovery.
    pub min_recovery_pct: f64,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period_days: None,
            min_drawdown_pct: 20.0,
            min_recovery_pct: 20.0,
        }
    }
}

impl ExtremaConfig {
    /// Exclusive window end for an entry at `entry_timestamp`.
    pub fn period_end(&self, entry_timestamp: i64) -> Option<i64> {
        self.period_days
            .map(|days| entry_timestamp + i64::from(days) * SECONDS_PER_DAY)
    }

    /// Run [`analyze`] with this configuration's window and thresholds.
    pub fn analyze(&self, entry_price: f64, entry_timestamp: i64, candles: &[Candle]) -> PeriodExtremaResult {
        analyze(
            entry_price,
            entry_timestamp,
            candles,
            self.period_end(entry_timestamp),
            self.min_drawdown_pct,
            self.min_recovery_pct,
        )
    }
}

/// A drawdown after the ATH followed by a recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReEntryOpportunity {
    pub drawdown_price: f64,
    pub drawdown_timestamp: i64,
    /// Decline from the ATH, in percent.
    pub drawdown_percent: f64,
    pub recovery_price: f64,
    pub recovery_timestamp: i64,
    /// Rise from the drawdown price, in percent.
    pub recovery_percent: f64,
}

/// Extrema statistics for one entry.
///
/// Multiples are relative to the entry price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodExtremaResult {
    pub period_ath_price: f64,
    pub period_ath_timestamp: i64,
    pub period_ath_multiple: f64,
    pub period_atl_price: f64,
    pub period_atl_timestamp: i64,
    pub period_atl_multiple: f64,
    pub post_ath_drawdown_price: Option<f64>,
    pub post_ath_drawdown_timestamp: Option<i64>,
    /// Decline from the ATH, in percent.
    pub post_ath_drawdown_percent: Option<f64>,
    pub post_ath_drawdown_multiple: Option<f64>,
    pub re_entry_opportunities: Vec<ReEntryOpportunity>,
}

impl PeriodExtremaResult {
    /// Result for a window with no movement: ATH and ATL at the entry.
    pub fn seeded(entry_price: f64, entry_timestamp: i64) -> Self {
        let multiple = if entry_price > 0.0 { 1.0 } else { 0.0 };
        Self {
            period_ath_price: entry_price,
            period_ath_timestamp: entry_timestamp,
            period_ath_multiple: multiple,
            period_atl_price: entry_price,
            period_atl_timestamp: entry_timestamp,
            period_atl_multiple: multiple,
            post_ath_drawdown_price: None,
            post_ath_drawdown_timestamp: None,
            post_ath_drawdown_percent: None,
            post_ath_drawdown_multiple: None,
            re_entry_opportunities: Vec::new(),
        }
    }
}

/// Analyze the candles strictly after `entry_timestamp` and strictly before
/// `period_end_exclusive`.
pub fn analyze(
    entry_price: f64,
    entry_timestamp: i64,
    candles: &[Candle],
    period_end_exclusive: Option<i64>,
    min_drawdown_pct: f64,
    min_recovery_pct: f64,
) -> PeriodExtremaResult {
    let seeded = PeriodExtremaResult::seeded(entry_price, entry_timestamp);
    if !entry_price.is_finite() || entry_price <= 0.0 {
        return seeded;
    }

    let window: Vec<&Candle> = candles
        .iter()
        .filter(|c| c.timestamp > entry_timestamp)
        .filter(|c| period_end_exclusive.map_or(true, |end| c.timestamp < end))
        .collect();

    let (ath_price, ath_ts) = window
        .iter()
        .fold((entry_price, entry_timestamp), |(best, ts), c| {
            if c.high > best {
                (c.high, c.timestamp)
            } else {
                (best, ts)
            }
        });

    let ath_multiple = ath_price / entry_price;
    if ath_multiple > MAX_ATH_MULTIPLE {
        warn!(
            entry_price,
            ath_price,
            ath_multiple,
            "ATH multiple exceeds sanity limit, discarding extrema"
        );
        return seeded;
    }

    let (atl_price, atl_ts) = window
        .iter()
        .take_while(|c| c.timestamp <= ath_ts)
        .fold((entry_price, entry_timestamp), |(best, ts), c| {
            if c.low < best {
                (c.low, c.timestamp)
            } else {
                (best, ts)
            }
        });

    let post_ath: Vec<&Candle> = window
        .iter()
        .copied()
        .filter(|c| c.timestamp > ath_ts)
        .collect();

    let drawdown = post_ath.iter().fold(None, |best: Option<(f64, i64)>, c| match best {
        Some((price, _)) if price <= c.low => best,
        _ => Some((c.low, c.timestamp)),
    });

    PeriodExtremaResult {
        period_ath_price: ath_price,
        period_ath_timestamp: ath_ts,
        period_ath_multiple: ath_multiple,
        period_atl_price: atl_price,
        period_atl_timestamp: atl_ts,
        period_atl_multiple: atl_price / entry_price,
        post_ath_drawdown_price: drawdown.map(|(p, _)| p),
        post_ath_drawdown_timestamp: drawdown.map(|(_, ts)| ts),
        post_ath_drawdown_percent: drawdown.map(|(p, _)| (ath_price - p) / ath_price * 100.0),
        post_ath_drawdown_multiple: drawdown.map(|(p, _)| p / entry_price),
        re_entry_opportunities: find_opportunities(&post_ath, ath_price, min_drawdown_pct, min_recovery_pct),
    }
}

fn find_opportunities(
    post_ath: &[&Candle],
    ath_price: f64,
    min_drawdown_pct: f64,
    min_recovery_pct: f64,
) -> Vec<ReEntryOpportunity> {
    let drawdown_threshold = ath_price * (1.0 - min_drawdown_pct / 100.0);
    let mut opportunities: Vec<ReEntryOpportunity> = Vec::new();
    let mut candidate: Option<(f64, i64)> = None;

    for candle in post_ath {
        if let Some((dd_price, dd_ts)) = candidate {
            let recovery_price = dd_price * (1.0 + min_recovery_pct / 100.0);
            if candle.timestamp > dd_ts && candle.high >= recovery_price {
                candidate = None;

                let duplicate = opportunities
                    .iter()
                    .any(|o| (o.drawdown_timestamp - dd_ts).abs() < DEDUP_WINDOW_SECS);
                if !duplicate {
                    opportunities.push(ReEntryOpportunity {
                        drawdown_price: dd_price,
                        drawdown_timestamp: dd_ts,
                        drawdown_percent: (ath_price - dd_price) / ath_price * 100.0,
                        recovery_price: candle.high,
                        recovery_timestamp: candle.timestamp,
                        recovery_percent: (candle.high / dd_price - 1.0) * 100.0,
                    });
                }
                continue;
            }
        }

        if candle.low <= drawdown_threshold && candidate.map_or(true, |(price, _)| candle.low < price) {
            candidate = Some((candle.low, candle.timestamp));
        }
    }

    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Candle> {
        vec![
            Candle::new(1000, 1.0, 1.2, 0.9, 1.1, 100.0),
            Candle::new(1100, 1.1, 1.5, 1.0, 1.4, 200.0),
            Candle::new(1200, 1.4, 2.0, 1.3, 1.8, 300.0),
            Candle::new(1300, 1.8, 1.8, 1.2, 1.5, 250.0),
            Candle::new(1400, 1.5, 1.5, 1.0, 1.2, 200.0),
            Candle::new(1500, 1.2, 1.6, 1.1, 1.5, 180.0),
        ]
    }

    #[test]
    fn test_six_candle_example() {
        let result = analyze(1.0, 1000, &sample(), None, 20.0, 20.0);

        assert_eq!(result.period_ath_price, 2.0);
        assert_eq!(result.period_ath_timestamp, 1200);
        assert_eq!(result.period_ath_multiple, 2.0);
        assert_eq!(result.post_ath_drawdown_price, Some(1.0));
        assert_eq!(result.post_ath_drawdown_timestamp, Some(1400));
        assert!((result.post_ath_drawdown_percent.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(result.post_ath_drawdown_multiple, Some(1.0));
    }

    #[test]
    fn test_atl_is_before_ath_only() {
        let result = analyze(1.0, 1000, &sample(), None, 20.0, 20.0);
        // The 1.0 low at 1100 ties the seed; the later 1.0 low is after the ATH.
        assert_eq!(result.period_atl_price, 1.0);
        assert_eq!(result.period_atl_timestamp, 1000);
        assert_eq!(result.period_atl_multiple, 1.0);
    }

    #[test]
    fn test_declining_series_keeps_seed() {
        let candles = vec![
            Candle::new(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            Candle::new(60, 1.0, 0.9, 0.8, 0.85, 1.0),
            Candle::new(120, 0.85, 0.85, 0.5, 0.6, 1.0),
        ];
        let result = analyze(1.0, 0, &candles, None, 20.0, 20.0);

        assert_eq!(result.period_ath_price, 1.0);
        assert_eq!(result.period_ath_multiple, 1.0);
        assert_eq!(result.post_ath_drawdown_price, Some(0.5));
        assert_eq!(result.post_ath_drawdown_timestamp, Some(120));
    }

    #[test]
    fn test_no_later_candles() {
        let result = analyze(1.0, 5000, &sample(), None, 20.0, 20.0);
        assert_eq!(result, PeriodExtremaResult::seeded(1.0, 5000));
        assert!(result.post_ath_drawdown_price.is_none());
    }

    #[test]
    fn test_period_end_is_exclusive() {
        let result = analyze(1.0, 1000, &sample(), Some(1200), 20.0, 20.0);
        assert_eq!(result.period_ath_price, 1.5);
        assert_eq!(result.period_ath_timestamp, 1100);
        assert!(result.post_ath_drawdown_price.is_none());
    }

    #[test]
    fn test_extreme_multiple_returns_seed() {
        let candles = vec![
            Candle::new(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            Candle::new(60, 1.0, 20_000.0, 1.0, 2.0, 1.0),
            Candle::new(120, 2.0, 2.0, 1.0, 1.5, 1.0),
        ];
        let result = analyze(1.0, 0, &candles, None, 20.0, 20.0);
        assert_eq!(result, PeriodExtremaResult::seeded(1.0, 0));
    }

    #[test]
    fn test_invalid_entry_price_returns_seed() {
        let result = analyze(0.0, 1000, &sample(), None, 20.0, 20.0);
        assert_eq!(result.period_ath_price, 0.0);
        assert!(result.re_entry_opportunities.is_empty());
    }

    #[test]
    fn test_re_entry_opportunity_pairing() {
        let result = analyze(1.0, 1000, &sample(), None, 20.0, 20.0);

        assert_eq!(result.re_entry_opportunities.len(), 1);
        let opportunity = &result.re_entry_opportunities[0];
        assert_eq!(opportunity.drawdown_price, 1.2);
        assert_eq!(opportunity.drawdown_timestamp, 1300);
        assert_eq!(opportunity.recovery_price, 1.5);
        assert_eq!(opportunity.recovery_timestamp, 1400);
        assert!((opportunity.drawdown_percent - 40.0).abs() < 1e-9);
        assert!((opportunity.recovery_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_opportunities_within_an_hour_are_deduplicated() {
        let hour = 3600;
        let candles = vec![
            Candle::new(0, 1.0, 10.0, 1.0, 9.0, 1.0),
            Candle::new(60, 9.0, 9.0, 5.0, 5.5, 1.0),    // drawdown 5.0
            Candle::new(120, 5.5, 7.0, 5.5, 6.5, 1.0),   // recovery
            Candle::new(180, 6.5, 6.5, 4.0, 4.5, 1.0),   // drawdown within the hour
            Candle::new(240, 4.5, 6.0, 4.5, 5.8, 1.0),   // recovery, dropped
            Candle::new(hour * 3, 5.8, 5.8, 3.0, 3.5, 1.0), // later drawdown
            Candle::new(hour * 3 + 60, 3.5, 5.0, 3.5, 4.8, 1.0),
        ];
        let result = analyze(1.0, -60, &candles, None, 20.0, 20.0);

        let timestamps: Vec<i64> = result
            .re_entry_opportunities
            .iter()
            .map(|o| o.drawdown_timestamp)
            .collect();
        assert_eq!(timestamps, vec![60, hour * 3]);
    }

    #[test]
    fn test_config_window() {
        let config = ExtremaConfig {
            enabled: true,
            period_days: Some(1),
            ..Default::default()
        };
        assert_eq!(config.period_end(100), Some(100 + 86_400));

        let candles = vec![
            Candle::new(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            Candle::new(3600, 1.0, 3.0, 1.0, 2.5, 1.0),
            Candle::new(90_000, 2.5, 9.0, 2.5, 8.0, 1.0),
        ];
        let result = config.analyze(1.0, 0, &candles);
        assert_eq!(result.period_ath_price, 3.0);
    }
}
