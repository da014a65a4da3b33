//! DataEngine lifecycle, routing, statistics, and concurrency

use data_engine::{
    AggressorSide, BarAggregation, BarSpecification, BarType, DataEngine, DataEngineConfig,
    PriceSource, TradeTick, last_price_key,
};
use market_cache::CacheConfig;
use pretty_assertions::assert_eq;
use rstest::*;
use std::sync::Arc;
use std::thread;
use tickforge_common::{EngineError, Px, Qty, Symbol, Ts};

const SYM: Symbol = Symbol::new(7);

#[fixture]
fn engine() -> DataEngine {
    DataEngine::new(DataEngineConfig {
        cache: CacheConfig {
            max_size: 64,
            default_ttl: None,
        },
        bar_types: vec![BarType::new(SYM, BarSpecification::tick_count(3))],
    })
}

fn tick(symbol: Symbol, price: f64, qty_units: i64, ts_ns: u64) -> TradeTick {
    TradeTick::new(
        symbol,
        Px::new(price),
        Qty::from_units(qty_units),
        AggressorSide::Buyer,
        format!("T-{ts_ns}"),
        Ts::from_nanos(ts_ns),
        Ts::from_nanos(ts_ns),
    )
}

#[rstest]
fn processing_requires_a_running_engine(engine: DataEngine) {
    let result = engine.process_trade_tick(&tick(SYM, 100.0, 1, 1));
    assert_eq!(result, Err(EngineError::NotRunning));
}

#[rstest]
fn start_is_rejected_while_running(engine: DataEngine) {
    engine.start().expect("first start succeeds");
    assert_eq!(engine.start(), Err(EngineError::AlreadyRunning));
    assert!(engine.is_running());
}

#[rstest]
fn stop_is_rejected_while_stopped(engine: DataEngine) {
    assert_eq!(engine.stop(), Err(EngineError::NotRunning));
}

#[rstest]
fn ticks_produce_bars_and_counters(engine: DataEngine) {
    engine.start().expect("start succeeds");

    let prices = [10.0, 11.0, 9.0, 12.0, 13.0, 8.0];
    let mut bars = Vec::new();
    for (i, price) in prices.iter().enumerate() {
        bars.extend(
            engine
                .process_trade_tick(&tick(SYM, *price, 1, i as u64 + 1))
                .expect("engine is running"),
        );
    }

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].close, Px::new(9.0));
    assert_eq!(bars[1].close, Px::new(8.0));

    let stats = engine.statistics();
    assert_eq!(stats.ticks_processed, 6);
    assert_eq!(stats.bars_generated, 2);
    assert_eq!(stats.rejected_ticks, 0);
}

#[rstest]
fn rejected_ticks_are_counted_and_leave_state_unchanged(engine: DataEngine) {
    engine.start().expect("start succeeds");

    engine
        .process_trade_tick(&tick(SYM, 10.0, 1, 1))
        .expect("valid tick");
    engine
        .process_trade_tick(&tick(SYM, 11.0, 1, 2))
        .expect("valid tick");

    // Zero price and zero quantity are both dropped before the aggregator
    let zero_price = engine
        .process_trade_tick(&tick(SYM, 0.0, 1, 3))
        .expect("rejection is not an error");
    assert!(zero_price.is_empty());
    let zero_qty = engine
        .process_trade_tick(&tick(SYM, 10.0, 0, 4))
        .expect("rejection is not an error");
    assert!(zero_qty.is_empty());

    // The third valid tick closes the bar as if the invalid ones never existed
    let bars = engine
        .process_trade_tick(&tick(SYM, 9.0, 1, 5))
        .expect("valid tick");
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].open, Px::new(10.0));
    assert_eq!(bars[0].high, Px::new(11.0));
    assert_eq!(bars[0].low, Px::new(9.0));
    assert_eq!(bars[0].close, Px::new(9.0));
    assert_eq!(bars[0].volume, Qty::from_units(3));

    let stats = engine.statistics();
    assert_eq!(stats.rejected_ticks, 2);
    assert_eq!(stats.ticks_processed, 3);
}

#[rstest]
fn latest_price_lands_in_the_cache(engine: DataEngine) {
    engine.start().expect("start succeeds");

    engine
        .process_trade_tick(&tick(SYM, 101.5, 1, 1))
        .expect("valid tick");

    assert_eq!(engine.last_price(SYM), Some(Px::new(101.5)));
    assert_eq!(
        engine.cache().get(&last_price_key(SYM)),
        Some(Px::new(101.5))
    );
    // Overwritten on the next tick
    engine
        .process_trade_tick(&tick(SYM, 102.0, 1, 2))
        .expect("valid tick");
    assert_eq!(engine.last_price(SYM), Some(Px::new(102.0)));
}

#[test]
fn bars_are_emitted_in_configuration_order() {
    let first = BarSpecification::tick_count(1);
    let second = BarSpecification::volume(Qty::from_units(1));
    let engine = DataEngine::new(DataEngineConfig {
        cache: CacheConfig::default(),
        bar_types: vec![BarType::new(SYM, first), BarType::new(SYM, second)],
    });
    engine.start().expect("start succeeds");

    // One tick closes a bar for both types
    let bars = engine
        .process_trade_tick(&tick(SYM, 100.0, 1, 1))
        .expect("valid tick");

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].bar_type.spec, first);
    assert_eq!(bars[1].bar_type.spec, second);
}

#[rstest]
fn stop_flushes_partial_bars(engine: DataEngine) {
    engine.start().expect("start succeeds");

    engine
        .process_trade_tick(&tick(SYM, 10.0, 1, 1))
        .expect("valid tick");
    engine
        .process_trade_tick(&tick(SYM, 11.0, 1, 2))
        .expect("valid tick");

    let partials = engine.stop().expect("engine was running");
    assert_eq!(partials.len(), 1);
    assert!(partials[0].is_partial);
    assert_eq!(partials[0].volume, Qty::from_units(2));
    assert!(!engine.is_running());

    // Partial bars count as generated
    assert_eq!(engine.statistics().bars_generated, 1);
}

#[rstest]
fn restart_resets_statistics_and_state(engine: DataEngine) {
    engine.start().expect("start succeeds");
    engine
        .process_trade_tick(&tick(SYM, 10.0, 1, 1))
        .expect("valid tick");
    engine.stop().expect("engine was running");

    engine.start().expect("restart succeeds");
    let stats = engine.statistics();
    assert_eq!(stats.ticks_processed, 0);
    assert_eq!(stats.bars_generated, 0);
    assert_eq!(stats.rejected_ticks, 0);

    // No state leaked from the previous run: three fresh ticks make one bar
    for i in 0..3u64 {
        let bars = engine
            .process_trade_tick(&tick(SYM, 10.0, 1, i + 10))
            .expect("valid tick");
        assert_eq!(bars.len(), usize::from(i == 2));
    }
}

#[rstest]
fn unconfigured_instruments_still_update_the_cache(engine: DataEngine) {
    engine.start().expect("start succeeds");

    let other = Symbol::new(99);
    let bars = engine
        .process_trade_tick(&tick(other, 55.0, 1, 1))
        .expect("valid tick");

    assert!(bars.is_empty());
    assert_eq!(engine.last_price(other), Some(Px::new(55.0)));
    assert_eq!(engine.statistics().ticks_processed, 1);
}

#[rstest]
fn bar_types_can_be_added_and_removed_at_runtime(engine: DataEngine) {
    engine.start().expect("start succeeds");

    let added = BarType::new(SYM, BarSpecification::tick_count(1));
    assert!(engine.add_bar_type(added));
    assert!(!engine.add_bar_type(added));

    let bars = engine
        .process_trade_tick(&tick(SYM, 100.0, 1, 1))
        .expect("valid tick");
    assert_eq!(bars.len(), 1);

    assert!(engine.remove_bar_type(&added));
    assert!(!engine.remove_bar_type(&added));
    let bars = engine
        .process_trade_tick(&tick(SYM, 100.0, 1, 2))
        .expect("valid tick");
    assert!(bars.is_empty());
}

#[test]
fn mid_sourced_bar_types_ignore_trade_ticks() {
    let spec = BarSpecification::tick_count(1).with_price_source(PriceSource::Mid);
    let engine = DataEngine::new(DataEngineConfig {
        cache: CacheConfig::default(),
        bar_types: vec![BarType::new(SYM, spec)],
    });
    engine.start().expect("start succeeds");

    let bars = engine
        .process_trade_tick(&tick(SYM, 100.0, 1, 1))
        .expect("valid tick");
    assert!(bars.is_empty());
}

#[test]
fn dollar_bars_flow_through_the_engine() {
    let spec = BarSpecification {
        aggregation: BarAggregation::Dollar {
            notional: 1_000 * 10_000,
        },
        price_source: PriceSource::Last,
    };
    let engine = DataEngine::new(DataEngineConfig {
        cache: CacheConfig::default(),
        bar_types: vec![BarType::new(SYM, spec)],
    });
    engine.start().expect("start succeeds");

    let mut bars = Vec::new();
    for i in 0..3u64 {
        bars.extend(
            engine
                .process_trade_tick(&tick(SYM, 100.0, 4, i + 1))
                .expect("valid tick"),
        );
    }
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].volume, Qty::from_units(10));
}

#[test]
fn instruments_process_concurrently() {
    let sym_a = Symbol::new(1);
    let sym_b = Symbol::new(2);
    let engine = Arc::new(DataEngine::new(DataEngineConfig {
        cache: CacheConfig::default(),
        bar_types: vec![
            BarType::new(sym_a, BarSpecification::tick_count(10)),
            BarType::new(sym_b, BarSpecification::tick_count(10)),
        ],
    }));
    engine.start().expect("start succeeds");

    let mut handles = Vec::new();
    for symbol in [sym_a, sym_b] {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let mut bars = 0usize;
            for i in 0..100u64 {
                bars += engine
                    .process_trade_tick(&tick(symbol, 100.0, 1, i + 1))
                    .expect("engine is running")
                    .len();
            }
            bars
        }));
    }
    let bars_per_symbol: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();

    // Same-instrument order is preserved inside each thread, so each symbol
    // closes exactly 100 / 10 bars
    assert_eq!(bars_per_symbol, vec![10, 10]);

    let stats = engine.statistics();
    assert_eq!(stats.ticks_processed, 200);
    assert_eq!(stats.bars_generated, 20);
    assert!(stats.processing_rate > 0.0);
    assert_eq!(engine.last_price(sym_a), Some(Px::new(100.0)));
    assert_eq!(engine.last_price(sym_b), Some(Px::new(100.0)));
}

#[rstest]
fn statistics_report_latency_and_cache_ratio(engine: DataEngine) {
    engine.start().expect("start succeeds");

    for i in 0..10u64 {
        engine
            .process_trade_tick(&tick(SYM, 100.0, 1, i + 1))
            .expect("valid tick");
    }
    // last_price drives cache hits
    for _ in 0..4 {
        engine.last_price(SYM);
    }

    let stats = engine.statistics();
    assert_eq!(stats.ticks_processed, 10);
    assert!(stats.max_latency_ns >= stats.avg_latency_ns);
    assert!(stats.cache_hit_ratio > 0.0);
    assert!(stats.processing_rate > 0.0);
}
