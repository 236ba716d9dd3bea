use super::{exit_reason, pct_change};
use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use crate::value_objects::params::PumpShortParams;
use crate::value_objects::position::{Position, Side};
use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;

/// Short-on-pump: enters a short at the close when the close-over-close
/// growth across `duration` bars reaches `pump_percent`, exits on
/// take-profit / stop-loss / lifetime in that order. Bars inside the
/// cooldown window are skipped entirely; the entry bar itself is consumed
/// (no same-bar exit check).
pub(crate) fn run(
    params: &PumpShortParams,
    candles: &[Candle],
) -> Result<Vec<Trade>, SweepError> {
    let mut trades = Vec::new();
    let mut position: Option<Position> = None;
    let mut cooldown_until: Option<usize> = None;

    for i in params.duration..candles.len() {
        if cooldown_until.is_some_and(|until| i <= until) {
            continue;
        }
        let close = candles[i].close;

        match position {
            None => {
                let past_close = candles[i - params.duration].close;
                let growth = pct_change(past_close, close)?;
                if growth >= params.pump_percent {
                    position = Some(Position {
                        entry_index: i,
                        entry_price: close,
                        side: Side::Short,
                    });
                }
            }
            Some(open) => {
                // short pnl: price falling below entry is profit
                let pnl = -pct_change(open.entry_price, close)?;
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
    }

    Ok(trades)
}
