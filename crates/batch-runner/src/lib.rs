//! Batch Runner
//!
//! Runs strategy simulations across many targets.
//!
//! # Features
//!
//! - **Batch Orchestrator**: Barrier or sliding-window bounded concurrency
//! - **Result Cache**: Content-addressed, TTL and capacity bounded
//! - **Candle Sources**: In-memory and JSON file sources
//! - **Result Sinks**: In-memory collection and structured logging
//!
//! # Example
//!
//! ```ignore
//! use batch_runner::{BatchOrchestrator, JsonFileCandleSource, LogSink, ResultCache, RunOptions};
//!
//! let cache = Arc::new(ResultCache::new(&CacheConfig::default()));
//! let orchestrator = BatchOrchestrator::new(Arc::new(JsonFileCandleSource::new("data")))
//!     .with_cache(cache)
//!     .with_sink(Arc::new(LogSink));
//!
//! let summary = orchestrator.run(&scenario, &targets, &RunOptions::default()).await?;
//! println!("{} ok, {} failed", summary.success, summary.failure);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod sinks;
pub mod sources;
pub mod types;

// Re-exports
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use config::RunnerConfig;
pub use error::{BatchError, CacheError, Result, TargetError};
pub use orchestrator::{
    BatchOrchestrator, Progress, ProgressCallback, RunOptions, RunSummary, Scheduling,
    TargetFailure,
};
pub use sinks::{LogSink, MemorySink, ResultSink};
pub use sources::{CandleSource, JsonFileCandleSource, MemoryCandleSource};
pub use types::{RunContext, Scenario, Target};
