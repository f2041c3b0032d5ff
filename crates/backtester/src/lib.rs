//! Backtester
//!
//! Deterministic candle-based strategy simulation.
//!
//! # Features
//!
//! - **Candle Validation**: Structural checks with stable reason codes
//! - **Cost Model**: Slippage, taker fee and borrow cost in basis points
//! - **Signal Gates**: Indicator conditions gating entries and exits
//! - **Strategy Simulator**: Entries, tiered targets, stops and re-entries
//! - **Period Extrema**: ATH/ATL, drawdown and re-entry opportunities
//!
//! # Example
//!
//! ```ignore
//! use backtester::{StrategyConfig, StrategyLeg, StopLossConfig, StrategySimulator};
//!
//! let config = StrategyConfig::new(vec![StrategyLeg::new(2.0, 0.5), StrategyLeg::new(4.0, 1.0)])
//!     .with_stop_loss(StopLossConfig::new(-0.3).with_trailing(0.5));
//!
//! let result = StrategySimulator::new(config).run_checked(&candles)?;
//! println!("PnL: {:.2}x", result.final_pnl);
//! ```

pub mod candle;
pub mod costs;
pub mod error;
pub mod extrema;
pub mod signals;
pub mod simulator;
pub mod validator;

// Re-exports
pub use candle::Candle;
pub use costs::CostConfig;
pub use error::{CandleDataError, ConfigError, SimulationError};
pub use extrema::{analyze, ExtremaConfig, PeriodExtremaResult, ReEntryOpportunity};
pub use signals::{
    Comparison, Indicator, IndicatorSeries, IndicatorSnapshot, Operand, SignalCondition,
    SignalConfig, SignalGroup, SignalLogic,
};
pub use simulator::{
    simulate, EntryConfig, EntryOptimization, ReEntryConfig, SimulationEvent,
    SimulationEventType, SimulationResult, StopLossConfig, StrategyConfig, StrategyLeg,
    StrategySimulator, Trigger,
};
pub use validator::{validate, validate_with_min, MIN_CANDLES};
