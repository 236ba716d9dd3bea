use crate::error::SweepError;
use crate::value_objects::candle::Candle;
use crate::value_objects::params::GridLongParams;
use crate::value_objects::trade::Trade;
use rust_decimal::Decimal;

struct GridLevel {
    price: Decimal,
    volume: Decimal,
    filled: bool,
}

/// Grid of staggered long limit levels below each anchor bar's close, with
/// volumes scaled geometrically per level. The inner scan walks every later
/// bar, filling levels the close crosses, and exits on the aggregate pnl of
/// the filled levels (take-profit tested before stop-loss). Commission is
/// notional-based per trade: fee on every filled entry leg plus the exit
/// leg. The cooldown starts at the exit bar, after which the next anchor is
/// considered.
pub(crate) fn run(
    params: &GridLongParams,
    candles: &[Candle],
    commission_fee: Decimal,
) -> Result<(Vec<Trade>, Decimal), SweepError> {
    let mut trades = Vec::new();
    let mut commission_total = Decimal::ZERO;
    let mut cooldown_until: Option<usize> = None;

    for i in 0..candles.len() {
        if cooldown_until.is_some_and(|until| i <= until) {
            continue;
        }
        let anchor = candles[i].close;

        let mut levels = Vec::with_capacity(params.number_of_averaging_steps + 1);
        let mut volume = params.first_position_volume;
        for k in 0..=params.number_of_averaging_steps {
            let offset = params.distance_to_first_order / Decimal::ONE_HUNDRED
                + params.averaging_step / Decimal::ONE_HUNDRED
                    * Decimal::from(k as u64)
                    * params.averaging_step_ratio;
            levels.push(GridLevel {
                price: anchor * (Decimal::ONE - offset),
                volume,
                filled: false,
            });
            volume *= params.position_volume_ratio;
        }

        'scan: for j in (i + 1)..candles.len() {
            let close = candles[j].close;
            for level in levels.iter_mut() {
                if !level.filled && close <= level.price {
                    level.filled = true;
                }
            }

            let mut total_volume = Decimal::ZERO;
            let mut weighted_price = Decimal::ZERO;
            let mut entry_notional = Decimal::ZERO;
            for level in levels.iter().filter(|l| l.filled) {
                total_volume += level.volume;
                weighted_price += level.price * level.volume;
                entry_notional += level.volume * level.price;
            }
            if total_volume.is_zero() {
                continue;
            }

            let avg_entry = weighted_price / total_volume;
            let pnl = (close - avg_entry)
                .checked_div(avg_entry)
                .ok_or_else(|| {
                    SweepError::Simulation("zero average entry price in grid".to_string())
                })?
                * Decimal::ONE_HUNDRED;

            if pnl >= params.take_profit || pnl <= -params.stop_loss {
                let exit_notional = total_volume * close;
                commission_total += (entry_notional + exit_notional) * commission_fee;
                trades.push(Trade {
                    entry_time: candles[i].timestamp,
                    exit_time: candles[j].timestamp,
                    entry_price: avg_entry,
                    exit_price: close,
                    pnl_percent: pnl,
                    profit_usd: pnl / Decimal::ONE_HUNDRED * total_volume,
                    duration_bars: j - i,
                });
                cooldown_until = Some(j + params.break_time);
                break 'scan;
            }
        }
    }

    Ok((trades, commission_total))
}
