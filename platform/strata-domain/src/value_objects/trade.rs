use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One closed round-turn. Appended to the run's ledger at exit and immutable
/// after that; ledger order matches entry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Entry bar timestamp, epoch milliseconds.
    pub entry_time: i64,
    /// Exit bar timestamp, epoch milliseconds.
    pub exit_time: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub pnl_percent: Decimal,
    pub profit_usd: Decimal,
    pub duration_bars: usize,
}
