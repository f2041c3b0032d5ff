//! Deterministic strategy simulator over a validated candle series.
//!
//! The simulator replays candles in order against a [`StrategyConfig`]:
//! it determines an entry, then walks every later candle applying re-entry
//! triggers, the breakeven trailing stop, the stop loss, tiered profit
//! targets and the optional exit signal, and finally force-closes whatever
//! is left. It performs no I/O and never fails; use
//! [`StrategySimulator::run_checked`] to reject malformed input up front.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candle::{minutes_between, Candle};
use crate::costs::CostConfig;
use crate::error::{ConfigError, SimulationError};
use crate::signals::{IndicatorSeries, SignalConfig, SignalGroup};
use crate::validator;

/// Remaining position below this is treated as flat.
const POSITION_EPSILON: f64 = 1e-12;

/// An optional fraction-valued setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fraction", rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    Disabled,
    Enabled(f64),
}

impl Trigger {
    /// The configured fraction, if enabled.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Trigger::Disabled => None,
            Trigger::Enabled(fraction) => Some(*fraction),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Trigger::Enabled(_))
    }
}

/// One tier of the profit-taking ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    /// Target as a multiple of the entry price (2.0 = 2x).
    pub target: f64,
    /// Fraction of the remaining position to close at the target.
    pub percent: f64,
}

impl StrategyLeg {
    pub fn new(target: f64, percent: f64) -> Self {
        Self { target, percent }
    }
}

/// How the position is entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Enter once the low drops this fraction from the first open (e.g. -0.3).
    pub initial_entry: Trigger,
    /// Enter once price retraces this fraction up from the window low.
    pub trailing_entry: Trigger,
    /// Trailing entry search window, in minutes.
    pub max_wait_time: i64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            initial_entry: Trigger::Disabled,
            trailing_entry: Trigger::Disabled,
            max_wait_time: 60,
        }
    }
}

/// Stop-loss settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLossConfig {
    /// Initial stop as a negative fraction from entry (e.g. -0.5).
    pub initial: f64,
    /// Move the stop to breakeven once price gains this fraction.
    #[serde(default)]
    pub trailing: Trigger,
}

impl StopLossConfig {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            trailing: Trigger::Disabled,
        }
    }

    pub fn with_trailing(mut self, activation: f64) -> Self {
        self.trailing = Trigger::Enabled(activation);
        self
    }
}

/// Re-entry after exits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReEntryConfig {
    /// Re-enter when price retraces this fraction below the reference price.
    pub trailing_re_entry: Trigger,
    /// Maximum number of re-entries.
    pub max_re_entries: u32,
    /// Size of each re-entry as a fraction of the original position.
    pub size_percent: f64,
}

/// Full strategy configuration for one simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Profit targets, processed in order.
    pub legs: Vec<StrategyLeg>,
    pub stop_loss: Option<StopLossConfig>,
    pub entry: Option<EntryConfig>,
    pub re_entry: Option<ReEntryConfig>,
    pub costs: Option<CostConfig>,
    pub signals: Option<SignalConfig>,
}

impl StrategyConfig {
    /// Create a strategy with the given profit targets and nothing else.
    pub fn new(legs: Vec<StrategyLeg>) -> Self {
        Self {
            legs,
            ..Default::default()
        }
    }

    pub fn with_stop_loss(mut self, stop_loss: StopLossConfig) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_entry(mut self, entry: EntryConfig) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_re_entry(mut self, re_entry: ReEntryConfig) -> Self {
        self.re_entry = Some(re_entry);
        self
    }

    pub fn with_costs(mut self, costs: CostConfig) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn with_signals(mut self, signals: SignalConfig) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Check every numeric setting is finite and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for leg in &self.legs {
            finite("legs.target", leg.target)?;
            finite("legs.percent", leg.percent)?;
            if leg.target <= 0.0 {
                return Err(ConfigError::out_of_range("legs.target", "must be > 0"));
            }
            if leg.percent <= 0.0 || leg.percent > 1.0 {
                return Err(ConfigError::out_of_range("legs.percent", "must be in (0, 1]"));
            }
        }

        if let Some(stop) = &self.stop_loss {
            finite("stop_loss.initial", stop.initial)?;
            if stop.initial <= -1.0 || stop.initial >= 0.0 {
                return Err(ConfigError::out_of_range("stop_loss.initial", "must be in (-1, 0)"));
            }
            if let Some(activation) = stop.trailing.fraction() {
                finite("stop_loss.trailing", activation)?;
                if activation <= 0.0 {
                    return Err(ConfigError::out_of_range("stop_loss.trailing", "must be > 0"));
                }
            }
        }

        if let Some(entry) = &self.entry {
            if let Some(drop) = entry.initial_entry.fraction() {
                finite("entry.initial_entry", drop)?;
                if drop <= -1.0 || drop >= 0.0 {
                    return Err(ConfigError::out_of_range("entry.initial_entry", "must be in (-1, 0)"));
                }
            }
            if let Some(retrace) = entry.trailing_entry.fraction() {
                finite("entry.trailing_entry", retrace)?;
                if retrace < 0.0 {
                    return Err(ConfigError::out_of_range("entry.trailing_entry", "must be >= 0"));
                }
            }
            if entry.max_wait_time < 0 {
                return Err(ConfigError::out_of_range("entry.max_wait_time", "must be >= 0"));
            }
        }

        if let Some(re_entry) = &self.re_entry {
            finite("re_entry.size_percent", re_entry.size_percent)?;
            if re_entry.size_percent <= 0.0 || re_entry.size_percent > 1.0 {
                return Err(ConfigError::out_of_range("re_entry.size_percent", "must be in (0, 1]"));
            }
            if let Some(retrace) = re_entry.trailing_re_entry.fraction() {
                finite("re_entry.trailing_re_entry", retrace)?;
                if retrace <= 0.0 || retrace >= 1.0 {
                    return Err(ConfigError::out_of_range(
                        "re_entry.trailing_re_entry",
                        "must be in (0, 1)",
                    ));
                }
            }
        }

        if let Some(costs) = &self.costs {
            costs.validate()?;
        }
        if let Some(signals) = &self.signals {
            signals.validate()?;
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

/// Kind of simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEventType {
    Entry,
    StopMoved,
    TargetHit,
    StopLoss,
    FinalExit,
    TrailingEntryTriggered,
    ReEntry,
    /// One step of a laddered entry.
    LadderEntry,
    /// One step of a laddered exit.
    LadderExit,
    /// The entry condition was never met.
    NoTrade,
}

/// One entry in the simulation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    #[serde(rename = "type")]
    pub event_type: SimulationEventType,
    pub timestamp: i64,
    pub price: f64,
    pub description: String,
    /// Open position as a fraction of the original size.
    pub remaining_position: f64,
    /// Cumulative PnL multiplier after this event.
    pub pnl_so_far: f64,
}

/// Diagnostics about entry timing and the path taken after entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryOptimization {
    /// Minutes between the first candle and the entry candle.
    pub entry_delay_minutes: f64,
    /// Lowest low seen after entry (seeded with the entry price).
    pub lowest_price: f64,
    pub lowest_price_timestamp: i64,
    /// Lowest price relative to entry, in percent (negative = below entry).
    pub lowest_price_percent: f64,
    pub lowest_price_time_from_entry_minutes: f64,
    /// Highest high seen after entry (seeded with the entry price).
    pub peak_price: f64,
    pub peak_price_timestamp: i64,
    pub peak_multiple: f64,
    pub time_to_peak_minutes: f64,
    /// Window low the trailing entry retraced from.
    pub trailing_entry_low: Option<f64>,
    /// The trailing entry timed out and entered at the window close.
    pub used_fallback: bool,
    pub re_entry_count: u32,
}

/// Outcome of one simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Final PnL multiplier (1.0 = breakeven).
    pub final_pnl: f64,
    pub events: Vec<SimulationEvent>,
    /// Raw (pre-cost) entry price.
    pub entry_price: f64,
    /// Price of the last exit.
    pub final_price: f64,
    pub total_candles: usize,
    pub entry_optimization: EntryOptimization,
}

impl SimulationResult {
    /// Timestamp of the first entry event, if a trade happened.
    pub fn entry_timestamp(&self) -> Option<i64> {
        self.events
            .iter()
            .find(|e| e.event_type == SimulationEventType::Entry)
            .map(|e| e.timestamp)
    }

    /// True when the simulation entered a position.
    pub fn traded(&self) -> bool {
        self.entry_timestamp().is_some()
    }

    pub fn is_profitable(&self) -> bool {
        self.final_pnl > 1.0
    }
}

/// Strategy simulator bound to one configuration.
#[derive(Debug, Clone)]
pub struct StrategySimulator {
    config: StrategyConfig,
}

impl StrategySimulator {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Run over candles that were already validated.
    pub fn run(&self, candles: &[Candle]) -> SimulationResult {
        simulate(candles, &self.config)
    }

    /// Validate the candles and configuration, then run.
    pub fn run_checked(&self, candles: &[Candle]) -> Result<SimulationResult, SimulationError> {
        validator::validate(candles)?;
        self.config.validate()?;
        Ok(self.run(candles))
    }
}

/// Simulate `config` over `candles`.
///
/// Candles must be validated and in chronological order. Empty input yields
/// an all-zero result.
pub fn simulate(candles: &[Candle], config: &StrategyConfig) -> SimulationResult {
    let (first, last) = match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return SimulationResult::default(),
    };

    let signals = config.signals.as_ref().filter(|s| !s.is_empty());
    let series = signals.map(|_| IndicatorSeries::compute(candles));
    let gate = Gate {
        series: series.as_ref(),
        entry: signals.and_then(|s| s.entry.as_ref()),
        exit: signals.and_then(|s| s.exit.as_ref()),
    };

    let entry = match find_entry(candles, config, &gate) {
        EntryDecision::Enter(entry) => entry,
        EntryDecision::NoTrade(reason) => {
            debug!(candles = candles.len(), %reason, "No trade");
            return SimulationResult {
                final_pnl: 1.0,
                events: vec![SimulationEvent {
                    event_type: SimulationEventType::NoTrade,
                    timestamp: last.timestamp,
                    price: last.close,
                    description: reason,
                    remaining_position: 0.0,
                    pnl_so_far: 1.0,
                }],
                entry_price: 0.0,
                final_price: last.close,
                total_candles: candles.len(),
                entry_optimization: EntryOptimization::default(),
            };
        }
    };

    let costs = config.costs.unwrap_or_default();
    let mut state = SimulationState::new(&entry, costs, config.stop_loss.as_ref());
    state.entry_delay_minutes = minutes_between(first.timestamp, entry.timestamp);

    if let Some(low) = entry.trailing_low {
        state.push(
            SimulationEventType::TrailingEntryTriggered,
            entry.timestamp,
            entry.price,
            if entry.used_fallback {
                format!(
                    "Trailing entry window elapsed, entering at close {:.8} (window low {:.8})",
                    entry.price, low
                )
            } else {
                format!("Trailing entry triggered at {:.8} (window low {:.8})", entry.price, low)
            },
        );
    }
    state.push(
        SimulationEventType::Entry,
        entry.timestamp,
        entry.price,
        format!(
            "Entry at {:.8} (cost-adjusted {:.8})",
            entry.price, state.entry_cost_basis
        ),
    );

    state.scan(&candles[entry.index + 1..], config, &gate, entry.index + 1);

    if state.remaining > POSITION_EPSILON {
        let price = state.reference_price.unwrap_or(last.close);
        let units = state.remaining;
        state.realize(units, price, last.timestamp);
        state.remaining = 0.0;
        state.push(
            SimulationEventType::FinalExit,
            last.timestamp,
            price,
            format!("Forced close of {:.1}% at {:.8}", units * 100.0, price),
        );
        state.final_price = price;
    }

    debug!(
        final_pnl = state.pnl,
        events = state.events.len(),
        re_entries = state.re_entry_count,
        "Simulation complete"
    );

    state.into_result(&entry, candles.len())
}

/// Resolved entry gates for a run.
struct Gate<'a> {
    series: Option<&'a IndicatorSeries>,
    entry: Option<&'a SignalGroup>,
    exit: Option<&'a SignalGroup>,
}

impl Gate<'_> {
    fn allows_entry(&self, index: usize) -> bool {
        match (self.entry, self.series) {
            (Some(group), Some(series)) => group.evaluate(series, index),
            _ => true,
        }
    }

    fn signals_exit(&self, index: usize) -> bool {
        match (self.exit, self.series) {
            (Some(group), Some(series)) => group.evaluate(series, index),
            _ => false,
        }
    }
}

struct EntryPoint {
    index: usize,
    timestamp: i64,
    price: f64,
    trailing_low: Option<f64>,
    used_fallback: bool,
}

enum EntryDecision {
    Enter(EntryPoint),
    NoTrade(String),
}

fn find_entry(candles: &[Candle], config: &StrategyConfig, gate: &Gate<'_>) -> EntryDecision {
    let entry_config = config.entry.unwrap_or_default();
    let first = candles[0];

    if let Some(drop) = entry_config.initial_entry.fraction() {
        let threshold = first.open * (1.0 + drop);
        return candles
            .iter()
            .enumerate()
            .find(|(i, c)| c.low <= threshold && gate.allows_entry(*i))
            .map(|(index, c)| {
                EntryDecision::Enter(EntryPoint {
                    index,
                    timestamp: c.timestamp,
                    price: threshold,
                    trailing_low: None,
                    used_fallback: false,
                })
            })
            .unwrap_or_else(|| {
                EntryDecision::NoTrade(format!(
                    "No trade: price never reached entry threshold {:.8}",
                    threshold
                ))
            });
    }

    if let Some(retrace) = entry_config.trailing_entry.fraction() {
        let window_end = first.timestamp + entry_config.max_wait_time * 60;
        let window_len = candles
            .iter()
            .take_while(|c| c.timestamp <= window_end)
            .count()
            .max(1);
        let window = &candles[..window_len];

        let (low_index, lowest) = window.iter().enumerate().fold(
            (0, first.low),
            |(best_i, best), (i, c)| if c.low < best { (i, c.low) } else { (best_i, best) },
        );
        let trigger = lowest * (1.0 + retrace);

        let triggered = window
            .iter()
            .enumerate()
            .skip(low_index + 1)
            .find(|(i, c)| c.high >= trigger && gate.allows_entry(*i));

        return match triggered {
            Some((index, c)) => EntryDecision::Enter(EntryPoint {
                index,
                timestamp: c.timestamp,
                price: trigger,
                trailing_low: Some(lowest),
                used_fallback: false,
            }),
            None => {
                let index = window_len - 1;
                let c = window[index];
                EntryDecision::Enter(EntryPoint {
                    index,
                    timestamp: c.timestamp,
                    price: c.close,
                    trailing_low: Some(lowest),
                    used_fallback: true,
                })
            }
        };
    }

    if gate.entry.is_some() {
        return candles
            .iter()
            .enumerate()
            .find(|(i, _)| gate.allows_entry(*i))
            .map(|(index, c)| {
                EntryDecision::Enter(EntryPoint {
                    index,
                    timestamp: c.timestamp,
                    price: c.close,
                    trailing_low: None,
                    used_fallback: false,
                })
            })
            .unwrap_or_else(|| EntryDecision::NoTrade("No trade: entry signal never satisfied".to_string()));
    }

    EntryDecision::Enter(EntryPoint {
        index: 0,
        timestamp: first.timestamp,
        price: first.open,
        trailing_low: None,
        used_fallback: false,
    })
}

/// Internal simulation state.
struct SimulationState {
    costs: CostConfig,
    stop_config: Option<StopLossConfig>,
    /// Raw price of the original entry; targets are multiples of this.
    original_entry: f64,
    /// Cost-adjusted original entry; every value is normalized by it.
    entry_cost_basis: f64,
    /// Raw price of the most recent entry (original or re-entry).
    active_entry: f64,
    active_entry_timestamp: i64,
    remaining: f64,
    leg_index: usize,
    stop_price: Option<f64>,
    stop_moved: bool,
    pnl: f64,
    reference_price: Option<f64>,
    final_price: f64,
    pending_re_entry: Option<f64>,
    re_entry_count: u32,
    events: Vec<SimulationEvent>,
    entry_delay_minutes: f64,
    lowest: (f64, i64),
    peak: (f64, i64),
}

impl SimulationState {
    fn new(entry: &EntryPoint, costs: CostConfig, stop_config: Option<&StopLossConfig>) -> Self {
        Self {
            costs,
            stop_config: stop_config.copied(),
            original_entry: entry.price,
            entry_cost_basis: entry.price * costs.entry_multiplier(),
            active_entry: entry.price,
            active_entry_timestamp: entry.timestamp,
            remaining: 1.0,
            leg_index: 0,
            stop_price: stop_config.map(|s| entry.price * (1.0 + s.initial)),
            stop_moved: false,
            pnl: 0.0,
            reference_price: None,
            final_price: entry.price,
            pending_re_entry: None,
            re_entry_count: 0,
            events: Vec::new(),
            entry_delay_minutes: 0.0,
            lowest: (entry.price, entry.timestamp),
            peak: (entry.price, entry.timestamp),
        }
    }

    fn push(&mut self, event_type: SimulationEventType, timestamp: i64, price: f64, description: String) {
        self.events.push(SimulationEvent {
            event_type,
            timestamp,
            price,
            description,
            remaining_position: self.remaining,
            pnl_so_far: self.pnl,
        });
    }

    /// Book the exit of `units` at raw `price` and return its contribution.
    fn realize(&mut self, units: f64, price: f64, timestamp: i64) -> f64 {
        let proceeds = units * price * self.costs.exit_multiplier() / self.entry_cost_basis;
        let lot_cost = units * self.active_entry * self.costs.entry_multiplier() / self.entry_cost_basis;
        let borrow = lot_cost
            * self
                .costs
                .borrow_cost_fraction(timestamp - self.active_entry_timestamp);
        let contribution = proceeds - borrow;
        self.pnl += contribution;
        self.final_price = price;
        contribution
    }

    fn re_entry_trigger(&self, config: &StrategyConfig, reference: f64) -> Option<f64> {
        let re_entry = config.re_entry.as_ref()?;
        let retrace = re_entry.trailing_re_entry.fraction()?;
        if self.re_entry_count >= re_entry.max_re_entries {
            return None;
        }
        Some(reference * (1.0 - retrace))
    }

    fn scan(&mut self, candles: &[Candle], config: &StrategyConfig, gate: &Gate<'_>, offset: usize) {
        for (i, candle) in candles.iter().enumerate() {
            let index = offset + i;

            if candle.high > self.peak.0 {
                self.peak = (candle.high, candle.timestamp);
            }
            if candle.low < self.lowest.0 {
                self.lowest = (candle.low, candle.timestamp);
            }

            // A pending re-entry is resolved before stop and target checks and
            // consumes the candle.
            if let Some(trigger) = self.pending_re_entry {
                if candle.low <= trigger {
                    self.pending_re_entry = None;
                    let size = config.re_entry.map(|r| r.size_percent).unwrap_or(0.0);
                    let units = size.min(1.0 - self.remaining);
                    if units > POSITION_EPSILON {
                        self.re_enter(units, trigger, candle.timestamp);
                        continue;
                    }
                }
            }

            if self.remaining > POSITION_EPSILON && !self.stop_moved {
                if let Some(activation) = self.stop_config.and_then(|s| s.trailing.fraction()) {
                    if candle.high >= self.active_entry * (1.0 + activation) {
                        let breakeven = self.active_entry;
                        self.stop_price = Some(self.stop_price.map_or(breakeven, |s| s.max(breakeven)));
                        self.stop_moved = true;
                        self.push(
                            SimulationEventType::StopMoved,
                            candle.timestamp,
                            breakeven,
                            format!("Stop moved to breakeven {:.8}", breakeven),
                        );
                    }
                }
            }

            if self.remaining > POSITION_EPSILON {
                if let Some(stop) = self.stop_price.filter(|stop| candle.low <= *stop) {
                    let units = self.remaining;
                    self.realize(units, stop, candle.timestamp);
                    self.remaining = 0.0;
                    self.reference_price = Some(stop);
                    self.push(
                        SimulationEventType::StopLoss,
                        candle.timestamp,
                        stop,
                        format!("Stop loss hit at {:.8}, closed {:.1}%", stop, units * 100.0),
                    );

                    match self.re_entry_trigger(config, self.original_entry) {
                        Some(trigger) => {
                            self.pending_re_entry = Some(trigger);
                            continue;
                        }
                        None => break,
                    }
                }
            }

            while self.remaining > POSITION_EPSILON && self.leg_index < config.legs.len() {
                let leg = config.legs[self.leg_index];
                let target_price = self.original_entry * leg.target;
                if candle.high < target_price {
                    break;
                }

                let units = self.remaining * leg.percent;
                self.realize(units, target_price, candle.timestamp);
                self.remaining -= units;
                if self.remaining < POSITION_EPSILON {
                    self.remaining = 0.0;
                }
                self.leg_index += 1;
                self.reference_price = Some(target_price);
                self.push(
                    SimulationEventType::TargetHit,
                    candle.timestamp,
                    target_price,
                    format!(
                        "Target {:.2}x hit at {:.8}, closed {:.1}% of position",
                        leg.target,
                        target_price,
                        units * 100.0
                    ),
                );

                if let Some(trigger) = self.re_entry_trigger(config, target_price) {
                    self.pending_re_entry = Some(trigger);
                }
            }

            if self.remaining > POSITION_EPSILON && gate.signals_exit(index) {
                let units = self.remaining;
                self.realize(units, candle.close, candle.timestamp);
                self.remaining = 0.0;
                self.push(
                    SimulationEventType::FinalExit,
                    candle.timestamp,
                    candle.close,
                    format!("Exit signal, closed {:.1}% at {:.8}", units * 100.0, candle.close),
                );
                break;
            }

            if self.remaining <= POSITION_EPSILON && self.pending_re_entry.is_none() {
                break;
            }
        }
    }

    /// Add `units` at `price`. PnL only moves when a lot is realized.
    fn re_enter(&mut self, units: f64, price: f64, timestamp: i64) {
        self.remaining += units;
        self.active_entry = price;
        self.active_entry_timestamp = timestamp;
        self.stop_price = self.stop_config.map(|s| price * (1.0 + s.initial));
        self.stop_moved = false;
        self.re_entry_count += 1;
        self.push(
            SimulationEventType::ReEntry,
            timestamp,
            price,
            format!(
                "Re-entry #{} at {:.8}, added {:.1}% of original size",
                self.re_entry_count,
                price,
                units * 100.0
            ),
        );
    }

    fn into_result(self, entry: &EntryPoint, total_candles: usize) -> SimulationResult {
        let entry_price = entry.price;
        let (lowest_price, lowest_ts) = self.lowest;
        let (peak_price, peak_ts) = self.peak;

        SimulationResult {
            final_pnl: self.pnl,
            events: self.events,
            entry_price,
            final_price: self.final_price,
            total_candles,
            entry_optimization: EntryOptimization {
                entry_delay_minutes: self.entry_delay_minutes,
                lowest_price,
                lowest_price_timestamp: lowest_ts,
                lowest_price_percent: (lowest_price / entry_price - 1.0) * 100.0,
                lowest_price_time_from_entry_minutes: minutes_between(entry.timestamp, lowest_ts),
                peak_price,
                peak_price_timestamp: peak_ts,
                peak_multiple: peak_price / entry_price,
                time_to_peak_minutes: minutes_between(entry.timestamp, peak_ts),
                trailing_entry_low: entry.trailing_low,
                used_fallback: entry.used_fallback,
                re_entry_count: self.re_entry_count,
            },
        }
    }
}
