//! Common error types for the market-data core

use thiserror::Error;

/// Engine lifecycle errors
///
/// Returned synchronously to the immediate caller; the engine never retries
/// internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Operation requires a running engine
    #[error("engine is not running")]
    NotRunning,

    /// `start` called on an engine that is already running
    #[error("engine is already running")]
    AlreadyRunning,
}

/// Malformed tick rejected before reaching an aggregator
///
/// Invalid ticks are dropped and counted, never propagated as a processing
/// failure; this type exists so validation has a single auditable gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickValidationError {
    /// Price must be strictly positive to be aggregatable
    #[error("non-positive price: {raw} ticks")]
    NonPositivePrice {
        /// Raw fixed-point price value
        raw: i64,
    },

    /// Quantity must be strictly positive to be aggregatable
    #[error("non-positive quantity: {raw} units")]
    NonPositiveQty {
        /// Raw fixed-point quantity value
        raw: i64,
    },
}
