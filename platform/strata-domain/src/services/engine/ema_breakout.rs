use super::{exit_reason, pct_change};
use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use crate::value_objects::params::EmaBreakoutParams;
use crate::value_objects::position::{Position, Side};
use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;

/// Breakout with EMA and volume confirmation: a long opens when the close
/// clears the prior window's high while above the EMA on above-average
/// volume; a short mirrors it against the window low. Entries fill at the
/// bar's open, and the exit checks run on the entry bar itself. Longs and
/// shorts carry their own pnl sign. No cooldown between trades.
pub(crate) fn run(
    params: &EmaBreakoutParams,
    candles: &[Candle],
) -> Result<Vec<Trade>, SweepError> {
    if params.length == 0 {
        return Err(SweepError::Simulation(
            "breakout window length must be at least 1".to_string(),
        ));
    }

    let mut trades = Vec::new();
    let mut position: Option<Position> = None;

    let ema_values = rolling_ema(candles, params.ema_period);
    let length = Decimal::from(params.length as u64);

    for i in params.length..candles.len() {
        let bar = &candles[i];
        let window = &candles[i - params.length..i];

        if position.is_none() {
            let mut highest = window[0].high;
            let mut lowest = window[0].low;
            let mut volume_sum = Decimal::ZERO;
            for w in window {
                highest = highest.max(w.high);
                lowest = lowest.min(w.low);
                volume_sum += w.volume;
            }
            let avg_volume = volume_sum / length;
            let volume_confirms = bar.volume > avg_volume;

            if volume_confirms && bar.close > highest && bar.close > ema_values[i] {
                position = Some(Position {
                    entry_index: i,
                    entry_price: bar.open,
                    side: Side::Long,
                });
            } else if volume_confirms && bar.close < lowest && bar.close < ema_values[i] {
                position = Some(Position {
                    entry_index: i,
                    entry_price: bar.open,
                    side: Side::Short,
                });
            }
        }

        if let Some(open) = position {
            let pnl = match open.side {
                Side::Long => pct_change(open.entry_price, bar.close)?,
                Side::Short => -pct_change(open.entry_price, bar.close)?,
            };
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
                    exit_time: bar.timestamp,
                    entry_price: open.entry_price,
                    exit_price: bar.close,
                    pnl_percent: pnl,
                    profit_usd: pnl / Decimal::ONE_HUNDRED * params.position_volume,
                    duration_bars: bars_in_position,
                });
                position = None;
            }
        }
    }

    Ok(trades)
}

/// Per-bar EMA of the close over the trailing `period + 1` bars, folded with
/// `k = 2 / (period + 1)` and seeded at the window's first close.
fn rolling_ema(candles: &[Candle], period: usize) -> Vec<Decimal> {
    let k = Decimal::from(2) / Decimal::from(period as u64 + 1);
    let one_minus_k = Decimal::ONE - k;

    (0..candles.len())
        .map(|idx| {
            let start = idx.saturating_sub(period);
            let window = &candles[start..=idx];
            let mut acc = window[0].close;
            for bar in &window[1..] {
                acc = bar.close * k + acc * one_minus_k;
            }
            acc
        })
        .collect()
}
