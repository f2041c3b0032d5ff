//! Indicator-based entry and exit gates.
//!
//! Indicators are precomputed once per simulation. Each index is built from
//! the previous index's running state (rolling sums for SMAs, the prior value
//! for EMAs, Wilder averages for RSI), so the whole series costs one pass.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::error::ConfigError;

const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;
const EMA_FAST: usize = 9;
const EMA_SLOW: usize = 21;
const RSI_PERIOD: usize = 14;
const VOLUME_SMA: usize = 20;

/// Indicator values available to signal conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Close,
    Volume,
    Sma20,
    Sma50,
    Ema9,
    Ema21,
    Rsi14,
    VolumeSma20,
}

/// Indicator values at one candle. `None` until the indicator is warm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub volume: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_9: Option<f64>,
    pub ema_21: Option<f64>,
    pub rsi_14: Option<f64>,
    pub volume_sma_20: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Close => Some(self.close),
            Indicator::Volume => Some(self.volume),
            Indicator::Sma20 => self.sma_20,
            Indicator::Sma50 => self.sma_50,
            Indicator::Ema9 => self.ema_9,
            Indicator::Ema21 => self.ema_21,
            Indicator::Rsi14 => self.rsi_14,
            Indicator::VolumeSma20 => self.volume_sma_20,
        }
    }
}

/// Rolling simple moving average.
#[derive(Debug, Clone)]
struct RollingSma {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
        }
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(dropped) = self.values.pop_front() {
                self.sum -= dropped;
            }
        }
        (self.values.len() == self.window).then(|| self.sum / self.window as f64)
    }
}

/// Exponential moving average seeded with the first observation.
#[derive(Debug, Clone)]
struct Ema {
    alpha: f64,
    window: usize,
    value: f64,
    count: usize,
}

impl Ema {
    fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window as f64 + 1.0),
            window,
            value: 0.0,
            count: 0,
        }
    }

    fn update(&mut self, price: f64) -> Option<f64> {
        if self.count == 0 {
            self.value = price;
        } else {
            self.value = self.alpha * price + (1.0 - self.alpha) * self.value;
        }
        self.count += 1;
        (self.count >= self.window).then_some(self.value)
    }
}

/// Wilder-smoothed RSI.
#[derive(Debug, Clone)]
struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    changes: usize,
}

impl Rsi {
    fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            changes: 0,
        }
    }

    fn update(&mut self, close: f64) -> Option<f64> {
        let prev = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return None,
        };
        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes += 1;

        let period = self.period as f64;
        if self.changes <= self.period {
            // Simple average over the seed window.
            self.avg_gain += gain / period;
            self.avg_loss += loss / period;
            if self.changes < self.period {
                return None;
            }
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        if self.avg_loss == 0.0 {
            return Some(if self.avg_gain == 0.0 { 50.0 } else { 100.0 });
        }
        let rs = self.avg_gain / self.avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

/// Per-candle indicator series for a candle sequence.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeries {
    snapshots: Vec<IndicatorSnapshot>,
}

impl IndicatorSeries {
    /// Build the series in a single forward pass.
    pub fn compute(candles: &[Candle]) -> Self {
        let mut sma_20 = RollingSma::new(SMA_SHORT);
        let mut sma_50 = RollingSma::new(SMA_LONG);
        let mut ema_9 = Ema::new(EMA_FAST);
        let mut ema_21 = Ema::new(EMA_SLOW);
        let mut rsi = Rsi::new(RSI_PERIOD);
        let mut volume_sma = RollingSma::new(VOLUME_SMA);

        let snapshots = candles
            .iter()
            .map(|candle| IndicatorSnapshot {
                close: candle.close,
                volume: candle.volume,
                sma_20: sma_20.update(candle.close),
                sma_50: sma_50.update(candle.close),
                ema_9: ema_9.update(candle.close),
                ema_21: ema_21.update(candle.close),
                rsi_14: rsi.update(candle.close),
                volume_sma_20: volume_sma.update(candle.volume),
            })
            .collect();

        Self { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorSnapshot> {
        self.snapshots.get(index)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Indicator(Indicator),
    Value(f64),
}

impl Operand {
    fn resolve(&self, snapshot: &IndicatorSnapshot) -> Option<f64> {
        match self {
            Operand::Indicator(indicator) => snapshot.get(*indicator),
            Operand::Value(value) => Some(*value),
        }
    }
}

/// Comparison applied between the indicator and the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    Below,
    /// Was at or below on the previous candle, above on this one.
    CrossesAbove,
    /// Was at or above on the previous candle, below on this one.
    CrossesBelow,
}

/// A single indicator comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalCondition {
    pub indicator: Indicator,
    pub comparison: Comparison,
    pub operand: Operand,
}

impl SignalCondition {
    pub fn new(indicator: Indicator, comparison: Comparison, operand: Operand) -> Self {
        Self {
            indicator,
            comparison,
            operand,
        }
    }

    /// Evaluate at `index`. Cold indicators evaluate false.
    pub fn evaluate(&self, series: &IndicatorSeries, index: usize) -> bool {
        let current = match series.get(index) {
            Some(snapshot) => snapshot,
            None => return false,
        };
        let (left, right) = match (current.get(self.indicator), self.operand.resolve(current)) {
            (Some(left), Some(right)) => (left, right),
            _ => return false,
        };

        match self.comparison {
            Comparison::Above => left > right,
            Comparison::Below => left < right,
            Comparison::CrossesAbove | Comparison::CrossesBelow => {
                let previous = match index.checked_sub(1).and_then(|i| series.get(i)) {
                    Some(snapshot) => snapshot,
                    None => return false,
                };
                let (prev_left, prev_right) =
                    match (previous.get(self.indicator), self.operand.resolve(previous)) {
                        (Some(l), Some(r)) => (l, r),
                        _ => return false,
                    };
                if self.comparison == Comparison::CrossesAbove {
                    prev_left <= prev_right && left > right
                } else {
                    prev_left >= prev_right && left < right
                }
            }
        }
    }
}

/// How conditions in a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLogic {
    #[default]
    All,
    Any,
}

/// A group of conditions combined with `all` or `any`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalGroup {
    #[serde(default)]
    pub logic: SignalLogic,
    pub conditions: Vec<SignalCondition>,
}

impl SignalGroup {
    pub fn all(conditions: Vec<SignalCondition>) -> Self {
        Self {
            logic: SignalLogic::All,
            conditions,
        }
    }

    pub fn any(conditions: Vec<SignalCondition>) -> Self {
        Self {
            logic: SignalLogic::Any,
            conditions,
        }
    }

    /// An empty group is always satisfied.
    pub fn evaluate(&self, series: &IndicatorSeries, index: usize) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match self.logic {
            SignalLogic::All => self.conditions.iter().all(|c| c.evaluate(series, index)),
            SignalLogic::Any => self.conditions.iter().any(|c| c.evaluate(series, index)),
        }
    }
}

/// Optional entry and exit gates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Candles failing this gate cannot be the entry candle.
    pub entry: Option<SignalGroup>,
    /// Once satisfied with a position open, the remainder exits at close.
    pub exit: Option<SignalGroup>,
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let groups = [("signals.entry", &self.entry), ("signals.exit", &self.exit)];
        for (field, group) in groups {
            let Some(group) = group else { continue };
            for condition in &group.conditions {
                if let Operand::Value(value) = condition.operand {
                    if !value.is_finite() {
                        return Err(ConfigError::NonFinite { field });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.exit.is_none()
    }
}
