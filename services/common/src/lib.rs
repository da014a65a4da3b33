//! Shared types for the TickForge market-data core
//!
//! Deterministic fixed-point market types (`Px`, `Qty`), instrument and
//! timestamp newtypes (`Symbol`, `Ts`), shared constants, and the common
//! error taxonomy used by the cache and engine crates.

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
