use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Spot,
    Futures,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Futures => "futures",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandleQuery {
    pub symbol: String,
    /// Window start, epoch milliseconds (inclusive).
    pub from_ms: i64,
    /// Window end, epoch milliseconds (inclusive).
    pub to_ms: i64,
    pub interval_minutes: u32,
    pub market_type: MarketType,
}

/// Source of historical candles. Implementations must return candles sorted
/// ascending by timestamp; the engine performs no deduplication.
pub trait MarketDataRepository {
    fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>, SweepError>;
}
