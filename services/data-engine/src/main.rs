//! Data engine demo binary
//!
//! Drives a seeded synthetic random-walk tick feed through a configured
//! engine and logs throughput and final statistics. No network I/O.

use anyhow::Result;
use clap::Parser;
use data_engine::{
    AggressorSide, BarSpecification, BarType, DataEngine, DataEngineConfig, TradeTick,
};
use market_cache::CacheConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tickforge_common::{Px, Qty, Symbol, Ts};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: u64 = 100_000;
const DEFAULT_SYMBOLS: u32 = 4;
const DEFAULT_CACHE_SIZE: usize = 10_000;
const CACHE_TTL_SECS: u64 = 3_600;
const TICK_SPACING_NANOS: u64 = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "data-engine", about = "Synthetic tick feed through the market-data core")]
struct Args {
    /// Number of ticks to generate
    #[arg(long, default_value_t = DEFAULT_TICKS)]
    ticks: u64,

    /// Number of instruments to spread ticks across
    #[arg(long, default_value_t = DEFAULT_SYMBOLS)]
    symbols: u32,

    /// Last-price cache capacity
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Random-walk seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let symbols = args.symbols.max(1);

    let mut bar_types = Vec::new();
    for id in 0..symbols {
        let symbol = Symbol::new(id);
        bar_types.push(BarType::new(symbol, BarSpecification::time_secs(1)));
        bar_types.push(BarType::new(symbol, BarSpecification::tick_count(100)));
        bar_types.push(BarType::new(
            symbol,
            BarSpecification::volume(Qty::from_units(500)),
        ));
    }

    let engine = DataEngine::new(DataEngineConfig {
        cache: CacheConfig {
            max_size: args.cache_size,
            default_ttl: Some(Duration::from_secs(CACHE_TTL_SECS)),
        },
        bar_types,
    });
    engine.start()?;
    info!(ticks = args.ticks, symbols, "feeding synthetic ticks");

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut prices: Vec<i64> = (0..symbols)
        .map(|_| 1_000_000 + rng.gen_range(-50_000..50_000))
        .collect();
    let base_ts = Ts::now();

    let mut bars_emitted = 0u64;
    for i in 0..args.ticks {
        let idx = (i % u64::from(symbols)) as usize;
        #[allow(clippy::cast_possible_truncation)]
        let symbol = Symbol::new(idx as u32);
        prices[idx] = (prices[idx] + rng.gen_range(-500..=500)).max(1);
        let qty = Qty::from_units(rng.gen_range(1..=50));
        let side = if rng.gen_bool(0.5) {
            AggressorSide::Buyer
        } else {
            AggressorSide::Seller
        };
        let tick = TradeTick::new(
            symbol,
            Px::from_i64(prices[idx]),
            qty,
            side,
            format!("T-{i}"),
            base_ts.add_nanos(i * TICK_SPACING_NANOS),
            Ts::now(),
        );
        bars_emitted += engine.process_trade_tick(&tick)?.len() as u64;
    }

    let partial_bars = engine.stop()?;
    let stats = engine.statistics();
    info!(
        ticks = stats.ticks_processed,
        bars = stats.bars_generated,
        closed = bars_emitted,
        partial = partial_bars.len(),
        rate = %format_args!("{:.0}/s", stats.processing_rate),
        avg_latency_ns = stats.avg_latency_ns,
        cache_hit_ratio = %format_args!("{:.1}%", stats.cache_hit_ratio),
        "run complete"
    );
    Ok(())
}
