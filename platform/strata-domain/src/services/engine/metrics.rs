use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

/// Sentinel profit factor when gross loss is exactly zero: keeps the metric
/// defined while ranking above any lossy run.
pub const PROFIT_FACTOR_SENTINEL: u32 = 999;

/// Summary metrics folded from one run's trade ledger.
///
/// `gross_loss` is the (non-positive) sum of losing trades' profit, so
/// `net_profit == gross_profit + gross_loss`. `max_drawdown_usd` is the
/// minimum of (cumulative profit − running peak) over the ledger, peak
/// seeded at zero, hence always ≤ 0.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub net_profit: Decimal,
    pub net_with_commission: Decimal,
    pub commission: Decimal,
    pub total_pnl_percent: Decimal,
    /// Win rate in percent; 0 when the ledger is empty.
    pub win_rate: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Decimal,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub max_drawdown_usd: Decimal,
    pub max_time_in_trade: usize,
    pub avg_time_in_trade: f64,
}

pub fn fold(trades: &[Trade], commission: Decimal) -> RunMetrics {
    let mut total_pnl = Decimal::ZERO;
    let mut gross_profit = Decimal::ZERO;
    let mut gross_loss = Decimal::ZERO;
    let mut wins = 0usize;
    let mut losses = 0usize;

    for trade in trades {
        total_pnl += trade.pnl_percent;
        if trade.pnl_percent > Decimal::ZERO {
            wins += 1;
            gross_profit += trade.profit_usd;
        } else {
            losses += 1;
            gross_loss += trade.profit_usd;
        }
    }

    let count = trades.len();
    let net_profit = gross_profit + gross_loss;
    let win_rate = if count > 0 {
        Decimal::from(wins as u64 * 100) / Decimal::from(count as u64)
    } else {
        Decimal::ZERO
    };
    let profit_factor = if gross_loss.is_zero() {
        Decimal::from(PROFIT_FACTOR_SENTINEL)
    } else {
        gross_profit / gross_loss.abs()
    };

    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;
    for trade in trades {
        cumulative += trade.profit_usd;
        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.min(cumulative - peak);
    }

    let max_time_in_trade = trades.iter().map(|t| t.duration_bars).max().unwrap_or(0);
    let avg_time_in_trade = if count > 0 {
        trades.iter().map(|t| t.duration_bars).sum::<usize>() as f64 / count as f64
    } else {
        0.0
    };

    RunMetrics {
        net_profit,
        net_with_commission: net_profit - commission,
        commission,
        total_pnl_percent: total_pnl,
        win_rate,
        gross_profit,
        gross_loss,
        profit_factor,
        trades: count,
        wins,
        losses,
        max_drawdown_usd: max_drawdown,
        max_time_in_trade,
        avg_time_in_trade,
    }
}
