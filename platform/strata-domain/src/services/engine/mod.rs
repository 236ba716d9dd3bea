//! The simulation engine: one deterministic state machine per strategy
//! variant. A run consumes one parameter set plus the shared candle series
//! and produces a trade ledger folded into summary metrics. State never
//! outlives the run and is never shared across runs.

mod drop_long;
mod ema_breakout;
mod grid_long;
pub mod metrics;
mod pump_short;

use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use crate::value_objects::params::StrategyParams;
use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

pub use metrics::RunMetrics;

/// Outcome of one (params, series) simulation run. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub params: StrategyParams,
    pub metrics: RunMetrics,
    pub trades: Vec<Trade>,
}

/// Runs the variant's state machine over the series and folds the ledger
/// into metrics. `commission_fee` is the per-side fee as a fraction
/// (e.g. 0.0005 for 0.05%).
///
/// An empty series is not an error: it yields zero trades and the scorer
/// rejects the run downstream. A `Simulation` error here means the input
/// was structurally unusable (e.g. a zero price where a division is
/// required) and is absorbed per configuration by the sweep worker.
pub fn backtest(
    params: &StrategyParams,
    candles: &[Candle],
    commission_fee: Decimal,
) -> Result<RunResult, SweepError> {
    let (trades, commission) = match params {
        StrategyParams::PumpShort(p) => {
            let trades = pump_short::run(p, candles)?;
            let commission = round_turn_commission(trades.len(), p.position_volume, commission_fee);
            (trades, commission)
        }
        StrategyParams::DropLong(p) => {
            let trades = drop_long::run(p, candles)?;
            let commission = round_turn_commission(trades.len(), p.position_volume, commission_fee);
            (trades, commission)
        }
        StrategyParams::GridLong(p) => grid_long::run(p, candles, commission_fee)?,
        StrategyParams::EmaBreakout(p) => {
            let trades = ema_breakout::run(p, candles)?;
            let commission = round_turn_commission(trades.len(), p.position_volume, commission_fee);
            (trades, commission)
        }
    };

    let metrics = metrics::fold(&trades, commission);
    Ok(RunResult {
        params: params.clone(),
        metrics,
        trades,
    })
}

/// Entry + exit legs for fixed-volume variants: trades × 2 × volume × fee.
fn round_turn_commission(trades: usize, position_volume: Decimal, fee: Decimal) -> Decimal {
    Decimal::from(trades as u64 * 2) * position_volume * fee
}

/// `(to - from) / from × 100`, failing on a zero base price.
pub(crate) fn pct_change(from: Decimal, to: Decimal) -> Result<Decimal, SweepError> {
    let ratio = (to - from)
        .checked_div(from)
        .ok_or_else(|| SweepError::Simulation("zero price in percent change".to_string()))?;
    Ok(ratio * Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitReason {
    TakeProfit,
    StopLoss,
    Timeout,
}

/// Exit checks in fixed priority order: take-profit, then stop-loss, then
/// timeout. The first true condition fires; nothing else is evaluated for
/// that bar.
pub(crate) fn exit_reason(
    pnl_percent: Decimal,
    take_profit: Decimal,
    stop_loss: Decimal,
    bars_in_position: usize,
    max_lifetime: usize,
) -> Option<ExitReason> {
    if pnl_percent >= take_profit {
        Some(ExitReason::TakeProfit)
    } else if pnl_percent <= -stop_loss {
        Some(ExitReason::StopLoss)
    } else if bars_in_position >= max_lifetime {
        Some(ExitReason::Timeout)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn take_profit_wins_when_both_thresholds_hold() {
        // take_profit = -10 and stop_loss = 5: pnl = -7 satisfies both.
        let reason = exit_reason(dec!(-7), dec!(-10), dec!(5), 1, 30000);
        assert_eq!(reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn stop_loss_checked_before_timeout() {
        let reason = exit_reason(dec!(-6), dec!(5), dec!(5), 50, 10);
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn timeout_fires_last() {
        let reason = exit_reason(dec!(0), dec!(5), dec!(5), 10, 10);
        assert_eq!(reason, Some(ExitReason::Timeout));
    }

    #[test]
    fn no_exit_when_nothing_holds() {
        assert_eq!(exit_reason(dec!(1), dec!(5), dec!(5), 3, 10), None);
    }

    #[test]
    fn pct_change_rejects_zero_base() {
        let err = pct_change(dec!(0), dec!(10)).unwrap_err();
        assert!(matches!(err, SweepError::Simulation(_)));
    }

    #[test]
    fn pct_change_basic() {
        assert_eq!(pct_change(dec!(100), dec!(110)).unwrap(), dec!(10));
        assert_eq!(pct_change(dec!(100), dec!(95)).unwrap(), dec!(-5));
    }

    #[test]
    fn empty_series_yields_a_zeroed_result() {
        use crate::value_objects::params::PumpShortParams;

        let params = StrategyParams::PumpShort(PumpShortParams {
            position_volume: dec!(100),
            pump_percent: dec!(10),
            take_profit: dec!(5),
            stop_loss: dec!(5),
            duration: 10,
            break_time: 5,
            max_position_lifetime: 30_000,
        });
        let result = backtest(&params, &[], dec!(0.0005)).unwrap();
        assert_eq!(result.metrics.trades, 0);
        assert_eq!(result.metrics.net_profit, Decimal::ZERO);
        assert_eq!(result.metrics.win_rate, Decimal::ZERO);
        assert_eq!(result.metrics.profit_factor, Decimal::from(999u32));
    }
}
