use super::{exit_reason, pct_change};
use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use crate::value_objects::params::DropLongParams;
use crate::value_objects::position::{Position, Side};
use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;

/// Long-on-drop: enters a long at the close when the fall from the lookback
/// bar's high reaches `drop_percent`. Unlike pump-short the cooldown gates
/// only the entry condition, and the entry bar immediately runs the exit
/// checks (pnl is zero there, so only a degenerate threshold can fire).
pub(crate) fn run(params: &DropLongParams, candles: &[Candle]) -> Result<Vec<Trade>, SweepError> {
    let mut trades = Vec::new();
    let mut position: Option<Position> = None;
    let mut cooldown_until: Option<usize> = None;

    for i in params.duration..candles.len() {
        let close = candles[i].close;

        if position.is_none() && !cooldown_until.is_some_and(|until| i <= until) {
            let past_high = candles[i - params.duration].high;
            let drop = -pct_change(past_high, close)?;
            if drop >= params.drop_percent {
                position = Some(Position {
                    entry_index: i,
                    entry_price: close,
                    side: Side::Long,
                });
            }
        }

        if let Some(open) = position {
            let pnl = pct_change(open.entry_price, close)?;
            let bars_in_position = i - open.entry_index;
            if exit_reason(
                pnl,
                params.take_profit,
                params.stop_loss,
                bars_in_position,
                params.max_position_lifetime,
            )
            .is_some()
            {
                trades.push(Trade {
                    entry_time: candles[open.entry_index].timestamp,
                    exit_time: candles[i].timestamp,
                    entry_price: open.entry_price,
                    exit_price: close,
                    pnl_percent: pnl,
                    profit_usd: pnl / Decimal::ONE_HUNDRED * params.position_volume,
                    duration_bars: bars_in_position,
                });
                position = None;
                cooldown_until = Some(i + params.break_time);
            }
        }
    }

    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(index: usize, high: Decimal, close: Decimal) -> Candle {
        Candle {
            timestamp: index as i64 * 60_000,
            open: close,
            high,
            low: close,
            close,
            volume: dec!(1),
        }
    }

    fn params() -> DropLongParams {
        DropLongParams {
            position_volume: dec!(100),
            drop_percent: dec!(10),
            take_profit: dec!(5),
            stop_loss: dec!(20),
            duration: 5,
            break_time: 10,
            max_position_lifetime: 30000,
        }
    }

    #[test]
    fn drop_measured_against_lookback_high() {
        // flat at 100, crash to 88 (12% below the high five bars back),
        // then recovery: 93 on bar 12 is +5.68% from entry, tp fires
        let mut candles: Vec<Candle> = (0..10).map(|i| candle(i, dec!(100), dec!(100))).collect();
        candles.push(candle(10, dec!(90), dec!(88)));
        candles.push(candle(11, dec!(90), dec!(90)));
        candles.push(candle(12, dec!(93), dec!(93)));
        candles.push(candle(13, dec!(95), dec!(95)));
        for i in 14..40 {
            candles.push(candle(i, dec!(95), dec!(95)));
        }

        let trades = run(&params(), &candles).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.entry_price, dec!(88));
        assert_eq!(trade.entry_time, 10 * 60_000);
        assert_eq!(trade.exit_time, 12 * 60_000);
        assert_eq!(trade.exit_price, dec!(93));
        assert!(trade.pnl_percent >= dec!(5));
    }

    #[test]
    fn long_pnl_sign_is_positive_on_recovery() {
        let mut candles: Vec<Candle> = (0..6).map(|i| candle(i, dec!(100), dec!(100))).collect();
        candles.push(candle(6, dec!(85), dec!(85)));
        candles.push(candle(7, dec!(92), dec!(92)));
        let trades = run(&params(), &candles).unwrap();
        assert_eq!(trades.len(), 1);
        assert!(trades[0].pnl_percent > Decimal::ZERO);
        assert!(trades[0].profit_usd > Decimal::ZERO);
    }

    #[test]
    fn no_entry_without_enough_lookback() {
        let candles: Vec<Candle> = (0..4).map(|i| candle(i, dec!(100), dec!(50))).collect();
        let trades = run(&params(), &candles).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn exit_index_never_precedes_entry_index() {
        let mut candles: Vec<Candle> = (0..6).map(|i| candle(i, dec!(100), dec!(100))).collect();
        for i in 6..60 {
            // sawtooth: repeated drops and rebounds
            let close = if i % 2 == 0 { dec!(85) } else { dec!(93) };
            candles.push(candle(i, dec!(100), close));
        }
        let trades = run(&params(), &candles).unwrap();
        for trade in &trades {
            assert!(trade.exit_time >= trade.entry_time);
        }
    }
}
