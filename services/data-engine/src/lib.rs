//! Real-time tick-to-bar aggregation engine
//!
//! Converts a continuous trade-tick stream into OHLCV bars across four
//! aggregation semantics (time, tick count, volume, notional) with
//! deterministic, exactly-once bar construction per instrument, and keeps
//! each instrument's latest price in a shared LRU+TTL cache.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod model;
pub mod registry;
pub(crate) mod stats;

pub use aggregator::BarAggregator;
pub use config::DataEngineConfig;
pub use engine::{DataEngine, EngineState, last_price_key};
pub use model::{
    AggressorSide, Bar, BarAggregation, BarSpecification, BarType, PriceSource, TradeTick,
};
pub use registry::AggregatorRegistry;
pub use stats::EngineStatistics;
