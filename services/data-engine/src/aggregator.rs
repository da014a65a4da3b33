//! Tick-to-bar state machine
//!
//! One `BarAggregator` per bar type. A terminal transition emits the closed
//! bar(s) and immediately reopens a new accumulating state, so there is no
//! idle state while the engine runs. Volume and Dollar bars use
//! split-and-carry: the portion of a tick needed to reach the threshold
//! closes the bar at exactly the threshold, the remainder seeds the next
//! bar, so one oversized tick can close several bars in a row.

use crate::model::{Bar, BarAggregation, BarType, TradeTick};
use tickforge_common::constants::fixed_point::SCALE_4;
use tickforge_common::{Px, Qty, Ts};
use tracing::debug;

/// Accumulator for the in-progress bar
#[derive(Debug, Clone, PartialEq, Eq)]
struct BarBuilder {
    open: Px,
    high: Px,
    low: Px,
    close: Px,
    volume: Qty,
    /// Accumulated notional in fixed-point ticks
    notional: i64,
    tick_count: u64,
    ts_open: Ts,
    ts_last: Ts,
}

impl BarBuilder {
    /// Open an empty accumulator; the first `update` sets the OHLC seed
    fn seed(price: Px, ts_open: Ts) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Qty::ZERO,
            notional: 0,
            tick_count: 0,
            ts_open,
            ts_last: ts_open,
        }
    }

    fn update(&mut self, price: Px, qty: Qty, notional: i64, ts: Ts) {
        if self.tick_count == 0 {
            self.open = price;
            self.high = price;
            self.low = price;
        } else {
            self.high = self.high.max(price);
            self.low = self.low.min(price);
        }
        self.close = price;
        self.volume = self.volume.add(qty);
        self.notional += notional;
        self.tick_count += 1;
        self.ts_last = ts;
    }

    fn into_bar(self, bar_type: BarType, ts_close: Ts, is_partial: bool) -> Bar {
        // Clamp so ts_close > ts_open holds even for single-tick bars
        let ts_close = if ts_close <= self.ts_open {
            self.ts_open.add_nanos(1)
        } else {
            ts_close
        };
        Bar {
            bar_type,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            ts_open: self.ts_open,
            ts_close,
            is_partial,
        }
    }
}

/// Per-bar-type state machine converting a tick stream into closed bars
#[derive(Debug, Clone, PartialEq)]
pub struct BarAggregator {
    bar_type: BarType,
    current: Option<BarBuilder>,
    last_close: Option<Px>,
}

impl BarAggregator {
    /// Create an aggregator with no open bar
    #[must_use]
    pub const fn new(bar_type: BarType) -> Self {
        Self {
            bar_type,
            current: None,
            last_close: None,
        }
    }

    /// Bar type this aggregator produces
    #[must_use]
    pub const fn bar_type(&self) -> &BarType {
        &self.bar_type
    }

    /// Close price of the most recently committed bar
    #[must_use]
    pub const fn last_close(&self) -> Option<Px> {
        self.last_close
    }

    /// True while a bar is accumulating
    #[must_use]
    pub const fn has_open_bar(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one validated tick; returns the bars it closed (usually zero or
    /// one, more when split-and-carry crosses several thresholds)
    pub fn handle_tick(&mut self, tick: &TradeTick) -> Vec<Bar> {
        match self.bar_type.spec.aggregation {
            BarAggregation::Time { interval_ns } => self.apply_time(tick, interval_ns),
            BarAggregation::TickCount { count } => self.apply_tick_count(tick, count),
            BarAggregation::Volume { threshold } => self.apply_volume(tick, threshold),
            BarAggregation::Dollar { notional } => self.apply_dollar(tick, notional),
        }
    }

    /// Close the in-progress bar early, flagged partial
    ///
    /// Closes at the last observed event time. Used when the engine stops;
    /// the aggregator is left with no open bar.
    pub fn flush(&mut self) -> Option<Bar> {
        let builder = self.current.take()?;
        let ts_close = builder.ts_last;
        Some(self.finish(builder, ts_close, true))
    }

    fn finish(&mut self, builder: BarBuilder, ts_close: Ts, is_partial: bool) -> Bar {
        self.last_close = Some(builder.close);
        let bar = builder.into_bar(self.bar_type, ts_close, is_partial);
        debug!(
            symbol = %bar.bar_type.symbol,
            open = %bar.open,
            close = %bar.close,
            volume = %bar.volume,
            is_partial = bar.is_partial,
            "closed bar"
        );
        bar
    }

    /// Fixed, aligned, non-overlapping buckets keyed by event time. A tick
    /// outside the current bucket closes it (close time = bucket end) and
    /// seeds the new bucket.
    fn apply_time(&mut self, tick: &TradeTick, interval_ns: u64) -> Vec<Bar> {
        let mut closed = Vec::new();
        if interval_ns == 0 {
            return closed;
        }
        if let Some(builder) = self
            .current
            .take_if(|b| tick.ts_event.as_nanos() >= b.ts_open.as_nanos() + interval_ns)
        {
            let ts_close = builder.ts_open.add_nanos(interval_ns);
            let bar = self.finish(builder, ts_close, false);
            closed.push(bar);
        }
        let bucket_start = Ts::from_nanos(tick.ts_event.as_nanos() / interval_ns * interval_ns);
        let builder = self
            .current
            .get_or_insert_with(|| BarBuilder::seed(tick.price, bucket_start));
        builder.update(tick.price, tick.qty, tick.notional(), tick.ts_event);
        closed
    }

    /// Closes after exactly `count` ticks; the Nth tick's price is the close
    fn apply_tick_count(&mut self, tick: &TradeTick, count: u64) -> Vec<Bar> {
        let builder = self
            .current
            .get_or_insert_with(|| BarBuilder::seed(tick.price, tick.ts_event));
        builder.update(tick.price, tick.qty, tick.notional(), tick.ts_event);
        match self.current.take_if(|b| b.tick_count >= count) {
            Some(builder) => {
                let bar = self.finish(builder, tick.ts_event, false);
                vec![bar]
            }
            None => Vec::new(),
        }
    }

    /// Closes at exactly `threshold` accumulated quantity, splitting the
    /// crossing tick and carrying the remainder into the next bar
    fn apply_volume(&mut self, tick: &TradeTick, threshold: Qty) -> Vec<Bar> {
        let mut closed = Vec::new();
        if !threshold.is_positive() {
            return closed;
        }
        let mut remaining = tick.qty;
        while remaining.is_positive() {
            let builder = self
                .current
                .get_or_insert_with(|| BarBuilder::seed(tick.price, tick.ts_event));
            // Open builders always sit below the threshold, so room > 0
            let room = threshold.sub(builder.volume);
            let fill = if remaining >= room { room } else { remaining };
            builder.update(tick.price, fill, tick.price.mul_qty(fill), tick.ts_event);
            remaining = remaining.sub(fill);
            if let Some(full) = self.current.take_if(|b| b.volume >= threshold) {
                let bar = self.finish(full, tick.ts_event, false);
                closed.push(bar);
            }
        }
        closed
    }

    /// Closes at exactly `threshold` accumulated notional. The split is
    /// done in notional space; the quantity portion backing the closing
    /// slice is derived by fixed-point division, and any sub-tick rounding
    /// stays in the carried remainder.
    fn apply_dollar(&mut self, tick: &TradeTick, threshold: i64) -> Vec<Bar> {
        let mut closed = Vec::new();
        if threshold <= 0 {
            return closed;
        }
        let mut remaining_notional = tick.notional();
        let mut remaining_qty = tick.qty;
        while remaining_notional > 0 {
            let builder = self
                .current
                .get_or_insert_with(|| BarBuilder::seed(tick.price, tick.ts_event));
            let room = threshold - builder.notional;
            if remaining_notional >= room {
                let qty_fill = Qty::from_i64(
                    ((room * SCALE_4) / tick.price.as_i64()).min(remaining_qty.as_i64()),
                );
                builder.update(tick.price, qty_fill, room, tick.ts_event);
                remaining_notional -= room;
                remaining_qty = remaining_qty.sub(qty_fill);
                if let Some(full) = self.current.take_if(|b| b.notional >= threshold) {
                    let bar = self.finish(full, tick.ts_event, false);
                    closed.push(bar);
                }
            } else {
                builder.update(tick.price, remaining_qty, remaining_notional, tick.ts_event);
                break;
            }
        }
        closed
    }
}
