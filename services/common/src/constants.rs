//! Shared constants
//!
//! Single source of truth for the magic numbers used across the workspace.

/// Fixed-point arithmetic scales
pub mod fixed_point {
    /// 4 decimal places (1 tick = 0.0001)
    pub const SCALE_4: i64 = 10_000;
    /// 2 decimal places (cents)
    pub const SCALE_2: i64 = 100;
}

/// Time conversion constants
pub mod time {
    /// Nanoseconds per second
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;
    /// Nanoseconds per millisecond
    pub const NANOS_PER_MILLI: u64 = 1_000_000;
    /// Nanoseconds per microsecond
    pub const NANOS_PER_MICRO: u64 = 1_000;
    /// Seconds per minute
    pub const SECS_PER_MIN: u64 = 60;
}

/// Numeric limits and sentinels
pub mod numeric {
    /// Zero as i64
    pub const ZERO_I64: i64 = 0;
}
