//! Result sinks.
//!
//! Sinks receive every successful target's [`RunContext`]. They are
//! best-effort: the orchestrator logs a failing sink and moves on.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::types::RunContext;

/// Consumer of completed per-target results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn handle(&self, context: &RunContext) -> anyhow::Result<()>;
}

/// Collects contexts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    contexts: Arc<RwLock<Vec<RunContext>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every context received so far.
    pub async fn contexts(&self) -> Vec<RunContext> {
        self.contexts.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn clear(&self) {
        self.contexts.write().await.clear();
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn handle(&self, context: &RunContext) -> anyhow::Result<()> {
        self.contexts.write().await.push(context.clone());
        Ok(())
    }
}

/// Writes one structured log line per target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn handle(&self, context: &RunContext) -> anyhow::Result<()> {
        let result = &context.result;
        info!(
            run_id = %context.run_id,
            scenario = %context.scenario,
            target = %context.target.id,
            final_pnl = result.final_pnl,
            entry_price = result.entry_price,
            final_price = result.final_price,
            events = result.events.len(),
            re_entries = result.entry_optimization.re_entry_count,
            ath_multiple = context.extrema.as_ref().map(|e| e.period_ath_multiple),
            cache_hit = context.cache_hit,
            candles = context.candle_count,
            "Target simulated"
        );
        Ok(())
    }
}
