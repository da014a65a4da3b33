//! Core market types
//!
//! Prices and quantities are i64 fixed-point with 4 decimal places so that
//! aggregation thresholds can be compared and split exactly; floats only
//! appear at external API boundaries.

use crate::constants::fixed_point::{SCALE_2, SCALE_4};
use crate::constants::numeric::ZERO_I64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u32);

impl Symbol {
    /// Create a new Symbol with the given id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SYM_{}", self.0)
    }
}

/// Price in fixed-point ticks (1 tick = 0.0001)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Px(i64);

impl Px {
    /// Zero price
    pub const ZERO: Self = Self(0);

    /// Create from a float price (external boundaries only)
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(scale_f64(value))
    }

    /// Price as f64 for external APIs; internal code stays fixed-point
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f64 / SCALE_4 as f64
        }
    }

    /// Create from i64 ticks
    #[must_use]
    pub const fn from_i64(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Create from an integer price with 2 decimal places (cents)
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents * (SCALE_4 / SCALE_2))
    }

    /// Price as i64 ticks
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// True if the price is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > ZERO_I64
    }

    /// Add two prices (fixed-point)
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Subtract two prices (fixed-point)
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    /// Multiply price by quantity to get notional value in fixed-point ticks
    #[must_use]
    pub const fn mul_qty(self, qty: Qty) -> i64 {
        (self.0 * qty.0) / SCALE_4
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE_4;
        let frac = (self.0 % SCALE_4).abs();
        write!(f, "{whole}.{frac:04}")
    }
}

/// Quantity in fixed-point units (1 unit = 0.0001)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qty(i64);

impl Qty {
    /// Zero quantity
    pub const ZERO: Self = Self(0);

    /// Create from a float quantity (external boundaries only)
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(scale_f64(value))
    }

    /// Quantity as f64 for external APIs; internal code stays fixed-point
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f64 / SCALE_4 as f64
        }
    }

    /// Create from whole units
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * SCALE_4)
    }

    /// Create from i64 fixed-point units
    #[must_use]
    pub const fn from_i64(units: i64) -> Self {
        Self(units)
    }

    /// Quantity as i64 fixed-point units
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// True if the quantity is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == ZERO_I64
    }

    /// True if the quantity is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > ZERO_I64
    }

    /// Add two quantities (fixed-point)
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Subtract two quantities (fixed-point)
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE_4;
        let frac = (self.0 % SCALE_4).abs();
        write!(f, "{whole}.{frac:04}")
    }
}

/// Timestamp in nanoseconds since the UNIX epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ts(pub u64);

impl Ts {
    /// Current wall-clock timestamp
    #[must_use]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        let nanos =
            duration.as_secs() * crate::constants::time::NANOS_PER_SEC
                + u64::from(duration.subsec_nanos());
        Self(nanos)
    }

    /// Create from nanoseconds since epoch
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since epoch
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Timestamp advanced by the given number of nanoseconds
    #[must_use]
    pub const fn add_nanos(self, nanos: u64) -> Self {
        Self(self.0 + nanos)
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Scale an f64 to fixed-point ticks, clamping at the i64 range
fn scale_f64(value: f64) -> i64 {
    let scaled = (value * SCALE_4 as f64).round();
    const MAX_SAFE: f64 = 9_223_372_036_854_775_807.0;
    const MIN_SAFE: f64 = -9_223_372_036_854_775_808.0;
    if scaled >= MAX_SAFE {
        i64::MAX
    } else if scaled <= MIN_SAFE {
        i64::MIN
    } else {
        #[allow(clippy::cast_possible_truncation)]
        {
            scaled as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn px_fixed_point_round_trip() {
        let px = Px::new(100.25);
        assert_eq!(px.as_i64(), 1_002_500);
        assert_eq!(px.as_f64(), 100.25);
        assert_eq!(format!("{px}"), "100.2500");
    }

    #[test]
    fn notional_is_price_times_qty() {
        let px = Px::from_i64(100 * 10_000); // 100.0
        let qty = Qty::from_units(3); // 3.0
        assert_eq!(px.mul_qty(qty), 300 * 10_000);
    }

    #[test]
    fn qty_arithmetic_is_exact() {
        let a = Qty::new(0.1);
        let b = Qty::new(0.2);
        assert_eq!(a.add(b), Qty::new(0.3));
        assert_eq!(b.sub(a), Qty::new(0.1));
    }
}
