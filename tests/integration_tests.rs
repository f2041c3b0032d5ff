//! Integration tests for component interactions.
//!
//! These tests verify that the major components work together correctly.

use std::sync::Arc;

use backtester::{
    analyze, simulate, validate, Candle, CostConfig, EntryConfig, ExtremaConfig, ReEntryConfig,
    SimulationEventType, StopLossConfig, StrategyConfig, StrategyLeg, StrategySimulator, Trigger,
};
use batch_runner::{
    BatchOrchestrator, BatchError, CacheConfig, MemoryCandleSource, MemorySink, ResultCache,
    RunOptions, Scenario, Scheduling, Target,
};

/// A pump-and-dump shaped series: dip, rally to ~3x, crash, partial recovery.
fn pump_and_dump(len: usize) -> Vec<Candle> {
    (0..len)
        .map(|i| {
            let t = i as f64 / len as f64;
            let mid = if t < 0.1 {
                1.0 - 3.0 * t
            } else if t < 0.5 {
                0.7 + 5.75 * (t - 0.1)
            } else if t < 0.7 {
                3.0 - 10.0 * (t - 0.5)
            } else {
                1.0 + 2.0 * (t - 0.7)
            };
            let open = mid * 0.99;
            let close = mid * 1.01;
            Candle::new(1_000_000 + i as i64 * 60, open, close * 1.02, open * 0.98, close, 500.0)
        })
        .collect()
}

fn dip_strategy() -> StrategyConfig {
    StrategyConfig::new(vec![
        StrategyLeg::new(2.0, 0.5),
        StrategyLeg::new(3.0, 1.0),
    ])
    .with_stop_loss(StopLossConfig::new(-0.3).with_trailing(0.5))
    .with_entry(EntryConfig {
        initial_entry: Trigger::Enabled(-0.2),
        ..Default::default()
    })
    .with_costs(CostConfig::new(25.0, 10.0))
}

/// Test that validated candles flow through the checked simulator.
#[test]
fn test_validate_then_simulate() {
    let candles = pump_and_dump(200);
    assert!(validate(&candles).is_ok());

    let result = StrategySimulator::new(dip_strategy()).run_checked(&candles).unwrap();

    assert!(result.traded());
    assert_eq!(result.total_candles, 200);
    assert_eq!(result.events.last().unwrap().remaining_position, 0.0);
    assert!(result
        .events
        .iter()
        .any(|e| e.event_type == SimulationEventType::TargetHit));
    assert!(result.final_pnl > 1.0);
}

/// Test that a defective series is rejected with its reason code.
#[test]
fn test_checked_simulation_rejects_bad_data() {
    let mut candles = pump_and_dump(200);
    candles[50].high = f64::NAN;

    let err = StrategySimulator::new(dip_strategy())
        .run_checked(&candles)
        .unwrap_err();
    assert!(err.to_string().contains("non_finite_value"));
}

/// Test that the simulator is deterministic across repeated runs.
#[test]
fn test_simulation_determinism() {
    let candles = pump_and_dump(300);
    let config = dip_strategy().with_re_entry(ReEntryConfig {
        trailing_re_entry: Trigger::Enabled(0.2),
        max_re_entries: 2,
        size_percent: 0.5,
    });

    let first = serde_json::to_string(&simulate(&candles, &config)).unwrap();
    for _ in 0..5 {
        assert_eq!(serde_json::to_string(&simulate(&candles, &config)).unwrap(), first);
    }
}

/// Test that extrema analysis composes with a simulation result.
#[test]
fn test_extrema_after_simulation() {
    let candles = pump_and_dump(200);
    let result = simulate(&candles, &dip_strategy());
    let entry_ts = result.entry_timestamp().unwrap();

    let extrema = analyze(result.entry_price, entry_ts, &candles, None, 20.0, 20.0);

    assert!(extrema.period_ath_price >= result.entry_price);
    assert!(extrema.period_ath_multiple > 3.0);
    assert!(extrema.period_ath_timestamp > entry_ts);
    assert!(extrema.post_ath_drawdown_percent.unwrap() > 50.0);
    assert!(extrema.period_atl_timestamp <= extrema.period_ath_timestamp);
}

/// Test strategy configuration round-trips through JSON with tagged triggers.
#[test]
fn test_strategy_config_json() {
    let json = r#"{
        "legs": [{"target": 2.0, "percent": 0.5}],
        "stop_loss": {"initial": -0.3, "trailing": {"mode": "enabled", "fraction": 0.5}},
        "entry": {"trailing_entry": {"mode": "enabled", "fraction": 0.1}, "max_wait_time": 30},
        "costs": {"taker_fee_bps": 10.0}
    }"#;
    let config: StrategyConfig = serde_json::from_str(json).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.stop_loss.unwrap().trailing, Trigger::Enabled(0.5));
    let entry = config.entry.unwrap();
    assert_eq!(entry.initial_entry, Trigger::Disabled);
    assert_eq!(entry.max_wait_time, 30);
    assert_eq!(config.costs.unwrap().entry_slippage_bps, 0.0);
}

fn source_with(targets: &[(&str, Vec<Candle>)]) -> Arc<MemoryCandleSource> {
    let source = MemoryCandleSource::new();
    for (id, candles) in targets {
        source.insert(*id, candles.clone());
    }
    Arc::new(source)
}

/// Test a full orchestrated run with cache, extrema and sinks.
#[tokio::test]
async fn test_orchestrated_run_end_to_end() {
    let source = source_with(&[
        ("alpha", pump_and_dump(120)),
        ("beta", pump_and_dump(240)),
        ("gamma", pump_and_dump(360)),
    ]);
    let sink = Arc::new(MemorySink::new());
    let cache = Arc::new(ResultCache::new(&CacheConfig::default()));
    let orchestrator = BatchOrchestrator::new(source)
        .with_cache(cache.clone())
        .with_sink(sink.clone());

    let scenario = Scenario::new("dip-buy", dip_strategy()).with_extrema(ExtremaConfig {
        enabled: true,
        ..Default::default()
    });
    let targets = vec![Target::new("alpha"), Target::new("beta"), Target::new("gamma")];

    let summary = orchestrator
        .run(&scenario, &targets, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.success, 3);
    assert_eq!(summary.cache_hits, 0);
    assert!(summary.results.iter().all(|c| c.extrema.is_some()));
    assert_eq!(sink.len().await, 3);
    assert_eq!(cache.len(), 3);

    let rerun = orchestrator
        .run(&scenario, &targets, &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(rerun.cache_hits, 3);
    assert_ne!(rerun.run_id, summary.run_id);
}

/// Test partial failure accounting across both scheduling modes.
#[tokio::test]
async fn test_partial_failures_are_counted() {
    let mut broken = pump_and_dump(100);
    broken[5].timestamp = broken[4].timestamp;

    let source = source_with(&[
        ("ok1", pump_and_dump(100)),
        ("ok2", pump_and_dump(100)),
        ("broken", broken),
        ("short", pump_and_dump(20)),
    ]);
    let orchestrator = BatchOrchestrator::new(source);
    let scenario = Scenario::new("dip-buy", dip_strategy());
    let targets: Vec<Target> = ["ok1", "broken", "missing", "ok2", "short"]
        .iter()
        .map(|id| Target::new(*id))
        .collect();

    for scheduling in [Scheduling::Barrier, Scheduling::SlidingWindow] {
        let options = RunOptions {
            max_concurrency: 2,
            fail_fast: false,
            scheduling,
            ..Default::default()
        };
        let summary = orchestrator.run(&scenario, &targets, &options).await.unwrap();

        assert_eq!(summary.success + summary.errors.len(), targets.len());
        assert_eq!(summary.success, 2);

        let mut codes: Vec<&str> = summary.errors.iter().map(|e| e.code.as_str()).collect();
        codes.sort();
        assert_eq!(codes, vec!["duplicate_timestamp", "insufficient_data", "not_found"]);
    }
}

/// Test that fail-fast surfaces the first failure as an aborted run.
#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let source = source_with(&[("ok", pump_and_dump(100))]);
    let orchestrator = BatchOrchestrator::new(source);

    let err = orchestrator
        .run(
            &Scenario::new("dip-buy", dip_strategy()),
            &[Target::new("ok"), Target::new("missing")],
            &RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::Aborted(_)));
    assert!(err.to_string().contains("missing"));
}

/// Test that target ranges restrict the candles a run sees.
#[tokio::test]
async fn test_target_range_limits_candles() {
    let candles = pump_and_dump(200);
    let start = candles[20].timestamp;
    let end = candles[120].timestamp;
    let source = source_with(&[("ranged", candles)]);
    let orchestrator = BatchOrchestrator::new(source);

    let summary = orchestrator
        .run(
            &Scenario::new("dip-buy", dip_strategy()),
            &[Target::new("ranged").with_range(start, end)],
            &RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(summary.results[0].candle_count, 100);
    assert_eq!(summary.results[0].result.total_candles, 100);
}
