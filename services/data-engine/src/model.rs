//! Market data model: trade ticks, bar specifications, and bars

use serde::{Deserialize, Serialize};
use tickforge_common::constants::time::NANOS_PER_SEC;
use tickforge_common::{Px, Qty, Symbol, TickValidationError, Ts};

/// Aggressor side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggressorSide {
    /// Buyer lifted the offer
    Buyer,
    /// Seller hit the bid
    Seller,
    /// Side unknown or crossed
    NoAggressor,
}

/// A single trade execution event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTick {
    /// Instrument the trade occurred on
    pub symbol: Symbol,
    /// Execution price
    pub price: Px,
    /// Executed quantity
    pub qty: Qty,
    /// Aggressor side
    pub side: AggressorSide,
    /// Venue trade identifier
    pub trade_id: String,
    /// Event time assigned by the venue
    pub ts_event: Ts,
    /// Time the tick entered this system
    pub ts_init: Ts,
}

impl TradeTick {
    /// Create a new trade tick
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        price: Px,
        qty: Qty,
        side: AggressorSide,
        trade_id: String,
        ts_event: Ts,
        ts_init: Ts,
    ) -> Self {
        Self {
            symbol,
            price,
            qty,
            side,
            trade_id,
            ts_event,
            ts_init,
        }
    }

    /// Check the tick is aggregatable: price and quantity strictly positive
    pub fn validate(&self) -> Result<(), TickValidationError> {
        if !self.price.is_positive() {
            return Err(TickValidationError::NonPositivePrice {
                raw: self.price.as_i64(),
            });
        }
        if !self.qty.is_positive() {
            return Err(TickValidationError::NonPositiveQty {
                raw: self.qty.as_i64(),
            });
        }
        Ok(())
    }

    /// Notional value (price x quantity) in fixed-point ticks
    #[must_use]
    pub const fn notional(&self) -> i64 {
        self.price.mul_qty(self.qty)
    }
}

/// Price series a bar is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceSource {
    /// Last traded price
    Last,
    /// Quote midpoint; fed by a quote stream, not by trade ticks
    Mid,
}

/// Aggregation kind and threshold
///
/// Closed enumeration: every consumer dispatches by exhaustive match, so a
/// new kind cannot be added without the compiler pointing at each site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarAggregation {
    /// Fixed-length intervals keyed by event time
    Time {
        /// Interval length in nanoseconds
        interval_ns: u64,
    },
    /// Bars of exactly `count` ticks
    TickCount {
        /// Ticks per bar
        count: u64,
    },
    /// Bars of exactly `threshold` accumulated quantity
    Volume {
        /// Quantity per bar
        threshold: Qty,
    },
    /// Bars of exactly `notional` accumulated price x quantity
    Dollar {
        /// Notional per bar, fixed-point ticks
        notional: i64,
    },
}

/// Aggregation rule: kind, threshold, and price source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarSpecification {
    /// Aggregation kind and threshold
    pub aggregation: BarAggregation,
    /// Price series the bar is built from
    pub price_source: PriceSource,
}

impl BarSpecification {
    /// Time bars of `secs` seconds, last-price sourced
    #[must_use]
    pub const fn time_secs(secs: u64) -> Self {
        Self {
            aggregation: BarAggregation::Time {
                interval_ns: secs * NANOS_PER_SEC,
            },
            price_source: PriceSource::Last,
        }
    }

    /// Time bars with an explicit nanosecond interval, last-price sourced
    #[must_use]
    pub const fn time_nanos(interval_ns: u64) -> Self {
        Self {
            aggregation: BarAggregation::Time { interval_ns },
            price_source: PriceSource::Last,
        }
    }

    /// Bars of `count` ticks, last-price sourced
    #[must_use]
    pub const fn tick_count(count: u64) -> Self {
        Self {
            aggregation: BarAggregation::TickCount { count },
            price_source: PriceSource::Last,
        }
    }

    /// Bars of `threshold` accumulated quantity, last-price sourced
    #[must_use]
    pub const fn volume(threshold: Qty) -> Self {
        Self {
            aggregation: BarAggregation::Volume { threshold },
            price_source: PriceSource::Last,
        }
    }

    /// Bars of `notional` accumulated notional, last-price sourced
    #[must_use]
    pub const fn dollar(notional: i64) -> Self {
        Self {
            aggregation: BarAggregation::Dollar { notional },
            price_source: PriceSource::Last,
        }
    }

    /// Same rule with a different price source
    #[must_use]
    pub const fn with_price_source(mut self, price_source: PriceSource) -> Self {
        self.price_source = price_source;
        self
    }
}

/// Instrument-scoped aggregation rule; the key space for aggregators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarType {
    /// Instrument identifier
    pub symbol: Symbol,
    /// Aggregation rule
    pub spec: BarSpecification,
}

impl BarType {
    /// Create a new bar type
    #[must_use]
    pub const fn new(symbol: Symbol, spec: BarSpecification) -> Self {
        Self { symbol, spec }
    }
}

/// OHLCV summary of trades over one aggregation window
///
/// Invariant: `low <= open`, `low <= close`, `high >= open`, `high >= close`,
/// `volume >= 0`, and `ts_close > ts_open` once closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Owning bar type
    pub bar_type: BarType,
    /// First trade price of the window
    pub open: Px,
    /// Highest trade price of the window
    pub high: Px,
    /// Lowest trade price of the window
    pub low: Px,
    /// Last trade price of the window
    pub close: Px,
    /// Accumulated quantity
    pub volume: Qty,
    /// Window open time
    pub ts_open: Ts,
    /// Window close time
    pub ts_close: Ts,
    /// True when the bar was closed early by `stop()` rather than by its
    /// threshold
    pub is_partial: bool,
}
