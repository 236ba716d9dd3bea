use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fixed-interval OHLCV bar.
///
/// A candle series is a `Vec<Candle>` sorted ascending by timestamp and
/// shared read-only by every simulation run; the engine only ever addresses
/// candles by index, never by timestamp arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}
