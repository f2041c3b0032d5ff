//! Batch orchestration.
//!
//! Runs one scenario over many targets with bounded concurrency. Each target
//! is fetched, validated, looked up in the result cache, simulated on a miss,
//! optionally analyzed for period extrema, and handed to the result sinks.
//!
//! Work runs cooperatively inside the caller's task: per-target futures are
//! joined in place rather than spawned, so the only suspension points are the
//! candle fetch and the sink calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use backtester::{simulate, validate_with_min};
use chrono::Utc;
use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::ResultCache;
use crate::error::{BatchError, Result, TargetError};
use crate::sinks::ResultSink;
use crate::sources::CandleSource;
use crate::types::{RunContext, Scenario, Target};

/// How targets are admitted for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
    /// Fixed batches of `max_concurrency` targets; batch `i + 1` starts only
    /// after every target in batch `i` has settled.
    #[default]
    Barrier,
    /// A counting semaphore keeps at most `max_concurrency` targets in
    /// flight and admits the next target as soon as one finishes. There are
    /// no batch boundaries: under fail-fast, targets already admitted when
    /// the first failure is seen still complete, and the rest are skipped.
    SlidingWindow,
}

/// Per-run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub max_concurrency: usize,
    /// Abort the run on the first per-target failure.
    pub fail_fast: bool,
    /// Report progress every this many successes (0 disables).
    pub progress_interval: usize,
    pub scheduling: Scheduling,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fail_fast: true,
            progress_interval: 10,
            scheduling: Scheduling::Barrier,
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(BatchError::InvalidOptions(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(BatchError::InvalidOptions(format!(
                "max_concurrency must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

/// Progress snapshot passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub run_id: Uuid,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// A recorded per-target failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub target: String,
    pub code: String,
    pub message: String,
}

impl From<&TargetError> for TargetFailure {
    fn from(error: &TargetError) -> Self {
        Self {
            target: error.target().to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub scenario: String,
    pub success: usize,
    pub failure: usize,
    pub cache_hits: usize,
    pub results: Vec<RunContext>,
    pub errors: Vec<TargetFailure>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    fn new(run_id: Uuid, scenario: &str) -> Self {
        Self {
            run_id,
            scenario: scenario.to_string(),
            success: 0,
            failure: 0,
            cache_hits: 0,
            results: Vec::new(),
            errors: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

/// Tallies outcomes and fires progress callbacks.
struct RunTally<'a> {
    summary: RunSummary,
    total: usize,
    options: &'a RunOptions,
    progress: Option<&'a ProgressCallback>,
}

impl RunTally<'_> {
    /// Record an outcome. Returns the error when it must abort the run.
    fn record(&mut self, outcome: std::result::Result<RunContext, TargetError>) -> std::result::Result<(), TargetError> {
        match outcome {
            Ok(context) => {
                self.summary.success += 1;
                if context.cache_hit {
                    self.summary.cache_hits += 1;
                }
                self.summary.results.push(context);

                let interval = self.options.progress_interval;
                if interval > 0 && self.summary.success % interval == 0 {
                    let progress = Progress {
                        run_id: self.summary.run_id,
                        succeeded: self.summary.success,
                        failed: self.summary.failure,
                        total: self.total,
                    };
                    info!(
                        run_id = %progress.run_id,
                        succeeded = progress.succeeded,
                        failed = progress.failed,
                        total = progress.total,
                        "Batch progress"
                    );
                    if let Some(callback) = self.progress {
                        callback(&progress);
                    }
                }
                Ok(())
            }
            Err(e) if self.options.fail_fast => Err(e),
            Err(e) => {
                warn!(
                    run_id = %self.summary.run_id,
                    target = %e.target(),
                    code = e.code(),
                    error = %e,
                    "Target failed"
                );
                self.summary.failure += 1;
                self.summary.errors.push(TargetFailure::from(&e));
                Ok(())
            }
        }
    }
}

/// Runs scenarios across targets.
pub struct BatchOrchestrator {
    source: Arc<dyn CandleSource>,
    sinks: Vec<Arc<dyn ResultSink>>,
    cache: Option<Arc<ResultCache>>,
    progress: Option<ProgressCallback>,
}

impl BatchOrchestrator {
    pub fn new(source: Arc<dyn CandleSource>) -> Self {
        Self {
            source,
            sinks: Vec::new(),
            cache: None,
            progress: None,
        }
    }

    /// Use a shared result cache.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Run `scenario` over `targets`.
    ///
    /// With `fail_fast` the first per-target failure aborts the run with
    /// [`BatchError::Aborted`]; otherwise failures are collected in the
    /// summary and every target is processed.
    pub async fn run(&self, scenario: &Scenario, targets: &[Target], options: &RunOptions) -> Result<RunSummary> {
        options.validate()?;
        scenario.strategy.validate()?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();

        info!(
            run_id = %run_id,
            scenario = %scenario.name,
            targets = targets.len(),
            max_concurrency = options.max_concurrency,
            fail_fast = options.fail_fast,
            scheduling = ?options.scheduling,
            "Starting batch run"
        );

        let mut tally = RunTally {
            summary: RunSummary::new(run_id, &scenario.name),
            total: targets.len(),
            options,
            progress: self.progress.as_ref(),
        };

        let outcome = match options.scheduling {
            Scheduling::Barrier => self.run_batches(run_id, scenario, targets, options, &mut tally).await,
            Scheduling::SlidingWindow => self.run_window(run_id, scenario, targets, options, &mut tally).await,
        };

        if let Err(e) = outcome {
            warn!(
                run_id = %run_id,
                target = %e.target(),
                code = e.code(),
                error = %e,
                "Aborting batch run"
            );
            return Err(BatchError::Aborted(e));
        }

        let mut summary = tally.summary;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        if let Some(cache) = &self.cache {
            let stats = cache.stats();
            debug!(
                run_id = %run_id,
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                expirations = stats.expirations,
                len = stats.len,
                "Cache stats"
            );
        }

        info!(
            run_id = %run_id,
            success = summary.success,
            failure = summary.failure,
            cache_hits = summary.cache_hits,
            elapsed_ms = summary.elapsed_ms,
            "Batch run complete"
        );

        Ok(summary)
    }

    async fn run_batches(
        &self,
        run_id: Uuid,
        scenario: &Scenario,
        targets: &[Target],
        options: &RunOptions,
        tally: &mut RunTally<'_>,
    ) -> std::result::Result<(), TargetError> {
        for (batch, chunk) in targets.chunks(options.max_concurrency).enumerate() {
            debug!(run_id = %run_id, batch, size = chunk.len(), "Dispatching batch");

            let outcomes = join_all(chunk.iter().map(|target| self.process(run_id, scenario, target))).await;
            for outcome in outcomes {
                tally.record(outcome)?;
            }
        }
        Ok(())
    }

    async fn run_window(
        &self,
        run_id: Uuid,
        scenario: &Scenario,
        targets: &[Target],
        options: &RunOptions,
        tally: &mut RunTally<'_>,
    ) -> std::result::Result<(), TargetError> {
        let semaphore = Semaphore::new(options.max_concurrency);
        let halted = AtomicBool::new(false);
        let mut first_error = None;

        let mut in_flight: FuturesUnordered<_> = targets
            .iter()
            .map(|target| {
                let semaphore = &semaphore;
                let halted = &halted;
                async move {
                    let _permit = semaphore.acquire().await.ok()?;
                    if halted.load(Ordering::Acquire) {
                        debug!(run_id = %run_id, target = %target.id, "Skipping target after failure");
                        return None;
                    }
                    Some(self.process(run_id, scenario, target).await)
                }
            })
            .collect();

        while let Some(outcome) = in_flight.next().await {
            let Some(outcome) = outcome else {
                continue;
            };
            if let Err(e) = tally.record(outcome) {
                halted.store(true, Ordering::Release);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn process(&self, run_id: Uuid, scenario: &Scenario, target: &Target) -> std::result::Result<RunContext, TargetError> {
        let candles = match self.source.fetch(target).await {
            Ok(Some(candles)) if !candles.is_empty() => candles,
            Ok(_) => {
                return Err(TargetError::NotFound {
                    target: target.id.clone(),
                })
            }
            Err(source) => {
                return Err(TargetError::Fetch {
                    target: target.id.clone(),
                    source,
                })
            }
        };

        validate_with_min(&candles, scenario.min_candles).map_err(|source| TargetError::InvalidData {
            target: target.id.clone(),
            source,
        })?;

        let key = self.cache.as_ref().and_then(|_| {
            ResultCache::generate_key(
                &scenario.strategy,
                &target.id,
                target.range_start,
                target.range_end,
                candles.len(),
            )
            .map_err(|e| warn!(target = %target.id, error = %e, "Cache key generation failed"))
            .ok()
        });

        let cached = match (&self.cache, &key) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };
        let cache_hit = cached.is_some();

        let result = match cached {
            Some(result) => {
                debug!(target = %target.id, "Cache hit");
                result
            }
            None => {
                let result = simulate(&candles, &scenario.strategy);
                if let (Some(cache), Some(key)) = (&self.cache, &key) {
                    cache.set(key, result.clone());
                }
                result
            }
        };

        let extrema = if scenario.extrema.enabled {
            result
                .entry_timestamp()
                .map(|entry_ts| scenario.extrema.analyze(result.entry_price, entry_ts, &candles))
        } else {
            None
        };

        let context = RunContext {
            run_id,
            scenario: scenario.name.clone(),
            target: target.clone(),
            result,
            extrema,
            cache_hit,
            candle_count: candles.len(),
            completed_at: Utc::now(),
        };

        for sink in &self.sinks {
            if let Err(e) = sink.handle(&context).await {
                warn!(target = %target.id, error = %e, "Result sink failed");
            }
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::sinks::{MemorySink, MockResultSink};
    use crate::sources::{MemoryCandleSource, MockCandleSource};
    use async_trait::async_trait;
    use backtester::{Candle, ExtremaConfig, StopLossConfig, StrategyConfig, StrategyLeg};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    fn walk(len: usize, base: f64) -> Vec<Candle> {
        (0..len)
            .map(|i| {
                let price = base * (1.0 + 0.02 * i as f64);
                Candle::new(i as i64 * 60, price, price * 1.03, price * 0.98, price * 1.01, 100.0)
            })
            .collect()
    }

    fn scenario() -> Scenario {
        Scenario::new(
            "test",
            StrategyConfig::new(vec![StrategyLeg::new(1.5, 0.5), StrategyLeg::new(2.0, 1.0)])
                .with_stop_loss(StopLossConfig::new(-0.3)),
        )
    }

    fn source_with(ids: &[&str]) -> Arc<MemoryCandleSource> {
        let source = MemoryCandleSource::new();
        for (i, id) in ids.iter().enumerate() {
            source.insert(*id, walk(60, 1.0 + i as f64));
        }
        Arc::new(source)
    }

    fn targets(ids: &[&str]) -> Vec<Target> {
        ids.iter().map(|id| Target::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_all_targets_succeed() {
        let ids = ["a", "b", "c", "d", "e"];
        let sink = Arc::new(MemorySink::new());
        let orchestrator = BatchOrchestrator::new(source_with(&ids)).with_sink(sink.clone());

        let summary = orchestrator
            .run(&scenario(), &targets(&ids), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.success, 5);
        assert_eq!(summary.failure, 0);
        assert_eq!(summary.results.len(), 5);
        assert_eq!(sink.len().await, 5);
        assert!(summary.results.iter().all(|c| c.run_id == summary.run_id));
    }

    #[tokio::test]
    async fn test_collects_failures_without_fail_fast() {
        let source = source_with(&["a", "b"]);
        let orchestrator = BatchOrchestrator::new(source);
        let options = RunOptions {
            fail_fast: false,
            max_concurrency: 2,
            ..Default::default()
        };
        let all = targets(&["a", "missing", "b", "gone", "nothing"]);

        let summary = orchestrator.run(&scenario(), &all, &options).await.unwrap();

        assert_eq!(summary.success + summary.errors.len(), all.len());
        assert_eq!(summary.failure, 3);
        assert!(summary.errors.iter().all(|e| e.code == "not_found"));
    }

    #[tokio::test]
    async fn test_fail_fast_halts_later_batches() {
        let source = source_with(&["a", "c", "d"]);
        let sink = Arc::new(MemorySink::new());
        let orchestrator = BatchOrchestrator::new(source).with_sink(sink.clone());
        let options = RunOptions {
            max_concurrency: 2,
            ..Default::default()
        };

        let err = orchestrator
            .run(&scenario(), &targets(&["a", "missing", "c", "d"]), &options)
            .await
            .unwrap_err();

        match err {
            BatchError::Aborted(TargetError::NotFound { target }) => assert_eq!(target, "missing"),
            other => panic!("unexpected error: {other}"),
        }
        // The sibling in the failing batch completed; the next batch never ran.
        let ids: Vec<String> = sink.contexts().await.into_iter().map(|c| c.target.id).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn test_invalid_data_reports_reason_code() {
        let source = MemoryCandleSource::new();
        let mut candles = walk(60, 1.0);
        candles[10].low = 0.0;
        source.insert("bad", candles);
        source.insert("short", walk(10, 1.0));

        let orchestrator = BatchOrchestrator::new(Arc::new(source));
        let options = RunOptions {
            fail_fast: false,
            ..Default::default()
        };
        let summary = orchestrator
            .run(&scenario(), &targets(&["bad", "short"]), &options)
            .await
            .unwrap();

        let codes: Vec<&str> = summary.errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["zero_price", "insufficient_data"]);
    }

    #[tokio::test]
    async fn test_fetch_error_is_per_target() {
        let mut source = MockCandleSource::new();
        source
            .expect_fetch()
            .returning(|target| match target.id.as_str() {
                "ok" => Ok(Some(walk(60, 1.0))),
                _ => Err(anyhow::anyhow!("upstream timeout")),
            });

        let orchestrator = BatchOrchestrator::new(Arc::new(source));
        let options = RunOptions {
            fail_fast: false,
            ..Default::default()
        };
        let summary = orchestrator
            .run(&scenario(), &targets(&["ok", "flaky"]), &options)
            .await
            .unwrap();

        assert_eq!(summary.success, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].code, "fetch_failed");
        assert_eq!(summary.errors[0].target, "flaky");
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_fail_target() {
        let mut sink = MockResultSink::new();
        sink.expect_handle()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let ids = ["a", "b", "c"];
        let orchestrator = BatchOrchestrator::new(source_with(&ids)).with_sink(Arc::new(sink));
        let summary = orchestrator
            .run(&scenario(), &targets(&ids), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.success, 3);
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let ids = ["a", "b", "c"];
        let cache = Arc::new(ResultCache::new(&CacheConfig::default()));
        let orchestrator = BatchOrchestrator::new(source_with(&ids)).with_cache(cache.clone());

        let first = orchestrator
            .run(&scenario(), &targets(&ids), &RunOptions::default())
            .await
            .unwrap();
        let second = orchestrator
            .run(&scenario(), &targets(&ids), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(first.cache_hits, 0);
        assert_eq!(second.cache_hits, 3);
        assert_eq!(cache.len(), 3);
        for (a, b) in first.results.iter().zip(&second.results) {
            assert_eq!(a.result, b.result);
        }
    }

    #[tokio::test]
    async fn test_progress_every_interval() {
        let ids = ["a", "b", "c", "d", "e"];
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let orchestrator = BatchOrchestrator::new(source_with(&ids))
            .on_progress(move |p| recorder.lock().unwrap().push(p.succeeded));
        let options = RunOptions {
            progress_interval: 2,
            ..Default::default()
        };

        orchestrator.run(&scenario(), &targets(&ids), &options).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_extrema_attached_when_enabled() {
        let ids = ["a"];
        let orchestrator = BatchOrchestrator::new(source_with(&ids));
        let scenario = scenario().with_extrema(ExtremaConfig {
            enabled: true,
            ..Default::default()
        });

        let summary = orchestrator
            .run(&scenario, &targets(&ids), &RunOptions::default())
            .await
            .unwrap();

        let extrema = summary.results[0].extrema.as_ref().unwrap();
        assert!(extrema.period_ath_price >= summary.results[0].result.entry_price);
    }

    #[tokio::test]
    async fn test_rejects_zero_concurrency() {
        let orchestrator = BatchOrchestrator::new(source_with(&[]));
        let options = RunOptions {
            max_concurrency: 0,
            ..Default::default()
        };
        let err = orchestrator.run(&scenario(), &[], &options).await.unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn test_rejects_concurrency_above_permit_limit() {
        let orchestrator = BatchOrchestrator::new(source_with(&["a"]));
        let options = RunOptions {
            max_concurrency: usize::MAX,
            scheduling: Scheduling::SlidingWindow,
            ..Default::default()
        };
        let err = orchestrator
            .run(&scenario(), &targets(&["a"]), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidOptions(_)));

        let at_limit = RunOptions {
            max_concurrency: Semaphore::MAX_PERMITS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_scenario() {
        let orchestrator = BatchOrchestrator::new(source_with(&["a"]));
        let bad = Scenario::new("bad", StrategyConfig::new(vec![StrategyLeg::new(-1.0, 0.5)]));
        let err = orchestrator
            .run(&bad, &targets(&["a"]), &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidScenario(_)));
    }

    /// Source that sleeps per target and records start/finish order.
    struct RecordingSource {
        inner: MemoryCandleSource,
        log: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl RecordingSource {
        fn new(ids: &[&str]) -> Self {
            let inner = MemoryCandleSource::new();
            for id in ids {
                inner.insert(*id, walk(60, 1.0));
            }
            Self {
                inner,
                log: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CandleSource for RecordingSource {
        async fn fetch(&self, target: &Target) -> anyhow::Result<Option<Vec<Candle>>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("start:{}", target.id));

            // Later ids finish sooner so completion order differs from input order.
            let delay = 100 - target.id.as_bytes()[0] as u64 % 50;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.log.lock().unwrap().push(format!("end:{}", target.id));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.fetch(target).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_barrier_waits_for_whole_batch() {
        let ids = ["a", "b", "c", "d"];
        let source = Arc::new(RecordingSource::new(&ids));
        let orchestrator = BatchOrchestrator::new(source.clone());
        let options = RunOptions {
            max_concurrency: 2,
            ..Default::default()
        };

        orchestrator.run(&scenario(), &targets(&ids), &options).await.unwrap();

        let log = source.log.lock().unwrap().clone();
        let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
        let first_batch_done = position("end:a").max(position("end:b"));
        let second_batch_start = position("start:c").min(position("start:d"));
        assert!(first_batch_done < second_batch_start);
        assert_eq!(source.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_window_bounds_in_flight() {
        let ids = ["a", "b", "c", "d", "e", "f", "g"];
        let source = Arc::new(RecordingSource::new(&ids));
        let orchestrator = BatchOrchestrator::new(source.clone());
        let options = RunOptions {
            max_concurrency: 3,
            scheduling: Scheduling::SlidingWindow,
            ..Default::default()
        };

        let summary = orchestrator.run(&scenario(), &targets(&ids), &options).await.unwrap();

        assert_eq!(summary.success, ids.len());
        assert_eq!(source.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sliding_window_fail_fast_aborts() {
        let orchestrator = BatchOrchestrator::new(source_with(&["a", "b", "c"]));
        let options = RunOptions {
            max_concurrency: 1,
            scheduling: Scheduling::SlidingWindow,
            ..Default::default()
        };

        let err = orchestrator
            .run(&scenario(), &targets(&["a", "missing", "b", "c"]), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Aborted(TargetError::NotFound { .. })));
    }
}
