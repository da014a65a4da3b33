//! Aggregator registry
//!
//! Owns the dynamic population of bar aggregators, organised as one lane
//! per instrument. A lane holds the configured specifications in
//! registration order next to a lazily filled arena of aggregator states,
//! so emitted bars always come out in configuration order. Each lane has
//! its own mutex: ticks for one instrument serialize, ticks for different
//! instruments proceed concurrently.

use crate::aggregator::BarAggregator;
use crate::model::{Bar, BarSpecification, BarType, PriceSource, TradeTick};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tickforge_common::Symbol;
use tracing::info;

/// Per-instrument aggregation lane
///
/// `states[i]` is the (lazily created) state machine for `specs[i]`.
#[derive(Debug, Default)]
struct Lane {
    specs: Vec<BarSpecification>,
    states: Vec<Option<BarAggregator>>,
}

/// Dynamic collection of bar aggregators keyed by (instrument, bar type)
#[derive(Debug, Default)]
pub struct AggregatorRegistry {
    lanes: RwLock<FxHashMap<Symbol, Mutex<Lane>>>,
}

impl AggregatorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bar type; returns false if it was already registered
    pub fn register(&self, bar_type: BarType) -> bool {
        let mut lanes = self.lanes.write();
        let lane = lanes.entry(bar_type.symbol).or_default().get_mut();
        if lane.specs.contains(&bar_type.spec) {
            return false;
        }
        lane.specs.push(bar_type.spec);
        lane.states.push(None);
        info!(symbol = %bar_type.symbol, "registered bar type");
        true
    }

    /// Remove a bar type and its state; returns whether it existed
    pub fn deregister(&self, bar_type: &BarType) -> bool {
        let mut lanes = self.lanes.write();
        let Some(lane_mutex) = lanes.get_mut(&bar_type.symbol) else {
            return false;
        };
        let lane = lane_mutex.get_mut();
        let Some(pos) = lane.specs.iter().position(|spec| *spec == bar_type.spec) else {
            return false;
        };
        lane.specs.remove(pos);
        lane.states.remove(pos);
        if lane.specs.is_empty() {
            lanes.remove(&bar_type.symbol);
        }
        true
    }

    /// Bar types configured for an instrument, in configuration order
    #[must_use]
    pub fn bar_types(&self, symbol: Symbol) -> Vec<BarType> {
        let lanes = self.lanes.read();
        lanes.get(&symbol).map_or_else(Vec::new, |lane| {
            lane.lock()
                .specs
                .iter()
                .map(|spec| BarType::new(symbol, *spec))
                .collect()
        })
    }

    /// Total number of registered bar types
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes
            .read()
            .values()
            .map(|lane| lane.lock().specs.len())
            .sum()
    }

    /// True when no bar types are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route a validated trade tick to every last-price aggregator
    /// configured for its instrument; bars come back in configuration
    /// order. State is created lazily on the first tick for a bar type.
    pub fn handle_trade(&self, tick: &TradeTick) -> Vec<Bar> {
        let lanes = self.lanes.read();
        let Some(lane_mutex) = lanes.get(&tick.symbol) else {
            return Vec::new();
        };
        let mut guard = lane_mutex.lock();
        let lane = &mut *guard;
        let mut bars = Vec::new();
        for (spec, state) in lane.specs.iter().zip(lane.states.iter_mut()) {
            // Mid-sourced bars are fed by the quote stream, not by trades
            if spec.price_source != PriceSource::Last {
                continue;
            }
            let aggregator = state
                .get_or_insert_with(|| BarAggregator::new(BarType::new(tick.symbol, *spec)));
            bars.extend(aggregator.handle_tick(tick));
        }
        bars
    }

    /// Close every live state into a partial bar and discard the state;
    /// registrations survive for the next engine start
    pub fn flush_all(&self) -> Vec<Bar> {
        let lanes = self.lanes.read();
        let mut symbols: Vec<Symbol> = lanes.keys().copied().collect();
        symbols.sort_unstable();
        let mut bars = Vec::new();
        for symbol in symbols {
            if let Some(lane_mutex) = lanes.get(&symbol) {
                let mut lane = lane_mutex.lock();
                for state in &mut lane.states {
                    if let Some(mut aggregator) = state.take() {
                        if let Some(bar) = aggregator.flush() {
                            bars.push(bar);
                        }
                    }
                }
            }
        }
        bars
    }
}
