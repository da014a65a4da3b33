//! Data engine configuration

use crate::model::BarType;
use market_cache::CacheConfig;
use serde::{Deserialize, Serialize};

/// Engine configuration: cache sizing plus the ordered bar-type list
///
/// The order of `bar_types` is the order bars are emitted in when a single
/// tick closes bars for several types of the same instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataEngineConfig {
    /// Last-price cache settings
    pub cache: CacheConfig,
    /// Bar types registered at engine construction, in emission order
    pub bar_types: Vec<BarType>,
}
