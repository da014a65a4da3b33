//! Data engine orchestrator
//!
//! Owns one shared cache handle, one aggregator registry, and an explicit
//! statistics recorder. Calls are synchronous and non-blocking; parallelism
//! comes from the registry's per-instrument lanes. The cache lock is only
//! ever taken after every lane lock has been released, so no lock-ordering
//! deadlock is possible.

use crate::config::DataEngineConfig;
use crate::model::{Bar, BarType, TradeTick};
use crate::registry::AggregatorRegistry;
use crate::stats::{EngineStatistics, StatsRecorder};
use market_cache::CacheStore;
use parking_lot::RwLock;
use std::time::Instant;
use tickforge_common::{EngineError, Px, Symbol};
use tracing::{debug, info};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Not accepting ticks
    Stopped,
    /// Accepting ticks
    Running,
}

/// Cache key holding the latest trade price of an instrument
#[must_use]
pub fn last_price_key(symbol: Symbol) -> String {
    format!("last_price:{symbol}")
}

/// Market data engine: tick ingestion, bar routing, last-price cache
#[derive(Debug)]
pub struct DataEngine {
    config: DataEngineConfig,
    cache: CacheStore<String, Px>,
    registry: AggregatorRegistry,
    stats: StatsRecorder,
    state: RwLock<EngineState>,
}

impl DataEngine {
    /// Create a stopped engine with the configured bar types registered
    #[must_use]
    pub fn new(config: DataEngineConfig) -> Self {
        let cache = CacheStore::new(config.cache.clone());
        let registry = AggregatorRegistry::new();
        for bar_type in &config.bar_types {
            registry.register(*bar_type);
        }
        Self {
            config,
            cache,
            registry,
            stats: StatsRecorder::new(),
            state: RwLock::new(EngineState::Stopped),
        }
    }

    /// Enter RUNNING and reset statistics
    pub fn start(&self) -> Result<(), EngineError> {
        let mut state = self.state.write();
        if *state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }
        self.stats.reset();
        self.cache.reset_statistics();
        *state = EngineState::Running;
        info!(bar_types = self.registry.len(), "data engine started");
        Ok(())
    }

    /// Quiesce new ticks, then flush every live aggregator state into a
    /// partial bar; returns the partial bars
    ///
    /// Safe to call concurrently with in-flight `process_trade_tick` calls:
    /// the state flips first, and the flush waits on each lane's mutex.
    pub fn stop(&self) -> Result<Vec<Bar>, EngineError> {
        {
            let mut state = self.state.write();
            if *state == EngineState::Stopped {
                return Err(EngineError::NotRunning);
            }
            *state = EngineState::Stopped;
        }
        let bars = self.registry.flush_all();
        if !bars.is_empty() {
            self.stats.record_bars(bars.len() as u64);
        }
        info!(partial_bars = bars.len(), "data engine stopped");
        Ok(bars)
    }

    /// Ingest one trade tick
    ///
    /// Fails with `EngineError::NotRunning` when stopped. Invalid ticks
    /// (non-positive price or quantity) are dropped and counted, never
    /// surfaced as errors, so a batch of ticks partially succeeds. Returns
    /// the bars the tick closed, in bar-type configuration order.
    pub fn process_trade_tick(&self, tick: &TradeTick) -> Result<Vec<Bar>, EngineError> {
        if *self.state.read() != EngineState::Running {
            return Err(EngineError::NotRunning);
        }
        if let Err(err) = tick.validate() {
            self.stats.record_rejected();
            debug!(symbol = %tick.symbol, trade_id = %tick.trade_id, %err, "rejected trade tick");
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let bars = self.registry.handle_trade(tick);
        self.cache.put(last_price_key(tick.symbol), tick.price);

        self.stats.record_tick();
        if !bars.is_empty() {
            self.stats.record_bars(bars.len() as u64);
        }
        #[allow(clippy::cast_possible_truncation)]
        self.stats.record_latency(started.elapsed().as_nanos() as u64);
        Ok(bars)
    }

    /// Latest cached trade price for an instrument
    #[must_use]
    pub fn last_price(&self, symbol: Symbol) -> Option<Px> {
        self.cache.get(&last_price_key(symbol))
    }

    /// Register a bar type at runtime; returns false if already present
    pub fn add_bar_type(&self, bar_type: BarType) -> bool {
        self.registry.register(bar_type)
    }

    /// Remove a bar type and its state; returns whether it existed
    pub fn remove_bar_type(&self, bar_type: &BarType) -> bool {
        self.registry.deregister(bar_type)
    }

    /// Snapshot of engine counters with cache hit-ratio pass-through
    #[must_use]
    pub fn statistics(&self) -> EngineStatistics {
        self.stats.snapshot(self.cache.statistics().hit_ratio())
    }

    /// True while the engine accepts ticks
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.state.read() == EngineState::Running
    }

    /// Shared handle to the underlying cache
    #[must_use]
    pub fn cache(&self) -> &CacheStore<String, Px> {
        &self.cache
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &DataEngineConfig {
        &self.config
    }
}
