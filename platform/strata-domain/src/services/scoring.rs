use crate::services::engine::RunResult;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Runs whose net profit after commission does not clear one unit of quote
/// currency have no edge worth ranking.
pub const MIN_NET_PROFIT: Decimal = Decimal::ONE;

/// A run result with its scalar ranking score. Rejected runs carry
/// `f64::NEG_INFINITY` and are dropped before aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub result: RunResult,
    pub score: f64,
}

/// Reduces one run to its ranking score, or `NEG_INFINITY` for degenerate
/// runs (no trades, or net-after-commission ≤ 1).
///
/// The formula rewards per-trade efficiency and win rate, counts net profit
/// directly, and penalizes trade frequency as an overfitting signal:
/// `10·(net/trades) + 0.5·win_rate + net − trades/250`.
pub fn score(result: &RunResult) -> f64 {
    let m = &result.metrics;
    if m.trades == 0 {
        return f64::NEG_INFINITY;
    }
    if m.net_with_commission <= MIN_NET_PROFIT {
        return f64::NEG_INFINITY;
    }

    let net = m.net_with_commission.to_f64().unwrap_or(0.0);
    let win_rate = m.win_rate.to_f64().unwrap_or(0.0);
    let trades = m.trades as f64;
    let avg_profit_per_trade = net / trades;

    avg_profit_per_trade * 10.0 + win_rate * 0.5 + net - trades / 250.0
}
