//! Engine statistics
//!
//! An explicit recorder owned by the engine (no process-wide singleton),
//! reset on every `start()`. Counters are relaxed atomics; snapshots are
//! eventually consistent under concurrent mutation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Point-in-time snapshot of engine counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineStatistics {
    /// Valid ticks processed since the last start
    pub ticks_processed: u64,
    /// Bars emitted since the last start (partial bars included)
    pub bars_generated: u64,
    /// Ticks dropped by validation since the last start
    pub rejected_ticks: u64,
    /// Ticks per second over the window since the last start
    pub processing_rate: f64,
    /// Mean per-tick processing latency in nanoseconds
    pub avg_latency_ns: u64,
    /// Worst per-tick processing latency in nanoseconds
    pub max_latency_ns: u64,
    /// Cache hit ratio pass-through, percent
    pub cache_hit_ratio: f64,
}

#[derive(Debug)]
pub(crate) struct StatsRecorder {
    ticks_processed: AtomicU64,
    bars_generated: AtomicU64,
    rejected_ticks: AtomicU64,
    latency_sum_ns: AtomicU64,
    latency_max_ns: AtomicU64,
    window_start: Mutex<Instant>,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self {
            ticks_processed: AtomicU64::new(0),
            bars_generated: AtomicU64::new(0),
            rejected_ticks: AtomicU64::new(0),
            latency_sum_ns: AtomicU64::new(0),
            latency_max_ns: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Zero every counter and restart the rate window
    pub(crate) fn reset(&self) {
        self.ticks_processed.store(0, Ordering::Relaxed);
        self.bars_generated.store(0, Ordering::Relaxed);
        self.rejected_ticks.store(0, Ordering::Relaxed);
        self.latency_sum_ns.store(0, Ordering::Relaxed);
        self.latency_max_ns.store(0, Ordering::Relaxed);
        *self.window_start.lock() = Instant::now();
    }

    pub(crate) fn record_tick(&self) {
        self.ticks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bars(&self, count: u64) {
        self.bars_generated.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_latency(&self, nanos: u64) {
        self.latency_sum_ns.fetch_add(nanos, Ordering::Relaxed);
        self.latency_max_ns.fetch_max(nanos, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, cache_hit_ratio: f64) -> EngineStatistics {
        let ticks = self.ticks_processed.load(Ordering::Relaxed);
        let elapsed = self.window_start.lock().elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let processing_rate = if elapsed > 0.0 {
            ticks as f64 / elapsed
        } else {
            0.0
        };
        let latency_sum = self.latency_sum_ns.load(Ordering::Relaxed);
        EngineStatistics {
            ticks_processed: ticks,
            bars_generated: self.bars_generated.load(Ordering::Relaxed),
            rejected_ticks: self.rejected_ticks.load(Ordering::Relaxed),
            processing_rate,
            avg_latency_ns: if ticks > 0 { latency_sum / ticks } else { 0 },
            max_latency_ns: self.latency_max_ns.load(Ordering::Relaxed),
            cache_hit_ratio,
        }
    }
}
