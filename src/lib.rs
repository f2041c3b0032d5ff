//! Strategy Lab: candle-based strategy backtesting
//!
//! This is the root crate that provides benchmark and integration test access
//! to the workspace crates. For actual functionality, use the individual
//! crates directly:
//!
//! - `backtester`: Candle validation, costs, signals, simulation, period extrema
//! - `batch-runner`: Result cache, batch orchestration, candle sources, sinks
//! - `sim-runner`: Command-line driver

// Re-export for benchmarks
pub use backtester as sim;
pub use batch_runner as batch;
