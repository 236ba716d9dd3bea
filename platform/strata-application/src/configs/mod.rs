//! Candidate parameter-space generation.
//!
//! Each variant owns a fixed candidate table; the full space is the lazy
//! Cartesian product of those tables in a fixed nesting order. A target
//! count takes a prefix of that product, so the cap is a plain `take`
//! rather than a balanced sample.

use rust_decimal::Decimal;
use std::path::Path;
use tracing::{info, warn};

use strata_domain::error::SweepError;
use strata_domain::value_objects::params::{
    DropLongParams, EmaBreakoutParams, GridLongParams, PumpShortParams, StrategyParams,
    StrategyVariant,
};

/// Effectively "no timeout" for the single-entry variants.
const OPEN_ENDED_LIFETIME: usize = 30_000;

pub fn generate(
    variant: StrategyVariant,
    position_volume: Decimal,
    target: Option<usize>,
) -> Vec<StrategyParams> {
    let cap = target.unwrap_or(usize::MAX);
    match variant {
        StrategyVariant::PumpShort => pump_short(position_volume).take(cap).collect(),
        StrategyVariant::DropLong => drop_long(position_volume).take(cap).collect(),
        StrategyVariant::GridLong => grid_long(position_volume).take(cap).collect(),
        StrategyVariant::EmaBreakout => ema_breakout(position_volume).take(cap).collect(),
    }
}

/// Loads the explicit override when it is readable; otherwise warns and
/// falls back to table generation. An override bypasses the target cap.
pub fn load_or_generate(
    variant: StrategyVariant,
    position_volume: Decimal,
    target: Option<usize>,
    override_file: Option<&Path>,
) -> Vec<StrategyParams> {
    if let Some(path) = override_file {
        match load_override(path) {
            Ok(configs) => {
                info!(
                    count = configs.len(),
                    path = %path.display(),
                    "loaded parameter override"
                );
                return configs;
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "override unreadable, generating instead");
            }
        }
    }
    generate(variant, position_volume, target)
}

fn load_override(path: &Path) -> Result<Vec<StrategyParams>, SweepError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        SweepError::Config(format!("failed to read {}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        SweepError::Config(format!("failed to parse {}: {err}", path.display()))
    })
}

fn pump_short(volume: Decimal) -> impl Iterator<Item = StrategyParams> {
    (1i64..=10).flat_map(move |pump| {
        (1i64..=5).flat_map(move |tp| {
            (1i64..=5).flat_map(move |sl| {
                [1usize, 5, 10, 15].into_iter().flat_map(move |duration| {
                    [1usize, 15, 30, 60].into_iter().map(move |break_time| {
                        StrategyParams::PumpShort(PumpShortParams {
                            position_volume: volume,
                            pump_percent: Decimal::from(pump),
                            take_profit: Decimal::from(tp),
                            stop_loss: Decimal::from(sl),
                            duration,
                            break_time,
                            max_position_lifetime: OPEN_ENDED_LIFETIME,
                        })
                    })
                })
            })
        })
    })
}

fn drop_long(volume: Decimal) -> impl Iterator<Item = StrategyParams> {
    [1i64, 2, 3, 4, 5, 10, 15, 20].into_iter().flat_map(move |drop| {
        [1i64, 2, 3, 4, 5, 10].into_iter().flat_map(move |tp| {
            [5i64, 10, 20, 30].into_iter().flat_map(move |sl| {
                [1usize, 5, 10, 15, 30].into_iter().flat_map(move |duration| {
                    [5usize, 30, 60, 120].into_iter().map(move |break_time| {
                        StrategyParams::DropLong(DropLongParams {
                            position_volume: volume,
                            drop_percent: Decimal::from(drop),
                            take_profit: Decimal::from(tp),
                            stop_loss: Decimal::from(sl),
                            duration,
                            break_time,
                            max_position_lifetime: OPEN_ENDED_LIFETIME,
                        })
                    })
                })
            })
        })
    })
}

fn grid_long(volume: Decimal) -> impl Iterator<Item = StrategyParams> {
    let ratios = [
        Decimal::ONE,
        Decimal::new(125, 2),
        Decimal::new(15, 1),
        Decimal::from(2),
        Decimal::from(3),
    ];
    let distances = [
        Decimal::new(5, 1),
        Decimal::ONE,
        Decimal::from(2),
        Decimal::from(3),
        Decimal::from(5),
    ];
    let steps = [
        Decimal::new(5, 1),
        Decimal::ONE,
        Decimal::from(2),
        Decimal::from(3),
        Decimal::from(5),
        Decimal::from(10),
    ];
    let step_ratios = [
        Decimal::new(5, 1),
        Decimal::ONE,
        Decimal::new(15, 1),
        Decimal::from(2),
    ];
    let take_profits = [
        Decimal::from(2),
        Decimal::from(3),
        Decimal::from(5),
        Decimal::from(8),
        Decimal::from(10),
        Decimal::from(15),
    ];
    let stop_losses = [
        Decimal::from(5),
        Decimal::from(10),
        Decimal::from(15),
        Decimal::from(20),
        Decimal::from(30),
        Decimal::from(45),
        Decimal::from(60),
    ];

    ratios.into_iter().flat_map(move |ratio| {
        distances.into_iter().flat_map(move |distance| {
            steps.into_iter().flat_map(move |step| {
                step_ratios.into_iter().flat_map(move |step_ratio| {
                    [3usize, 5, 10, 15, 20].into_iter().flat_map(move |levels| {
                        take_profits.into_iter().flat_map(move |tp| {
                            stop_losses.into_iter().flat_map(move |sl| {
                                [30usize, 60, 120, 240, 480].into_iter().map(
                                    move |break_time| {
                                        StrategyParams::GridLong(GridLongParams {
                                            first_position_volume: volume,
                                            position_volume_ratio: ratio,
                                            distance_to_first_order: distance,
                                            averaging_step: step,
                                            averaging_step_ratio: step_ratio,
                                            number_of_averaging_steps: levels,
                                            take_profit: tp,
                                            stop_loss: sl,
                                            break_time,
                                        })
                                    },
                                )
                            })
                        })
                    })
                })
            })
        })
    })
}

fn ema_breakout(volume: Decimal) -> impl Iterator<Item = StrategyParams> {
    let take_profits = [Decimal::new(5, 1), Decimal::new(75, 2), Decimal::ONE];
    let stop_losses = [
        Decimal::new(25, 2),
        Decimal::new(5, 1),
        Decimal::new(75, 2),
        Decimal::ONE,
    ];

    [5usize, 8, 10, 15].into_iter().flat_map(move |length| {
        [8usize, 20, 50, 100].into_iter().flat_map(move |ema_period| {
            take_profits.into_iter().flat_map(move |tp| {
                stop_losses.into_iter().flat_map(move |sl| {
                    [15usize, 30, 45, 60].into_iter().map(move |lifetime| {
                        StrategyParams::EmaBreakout(EmaBreakoutParams {
                            position_volume: volume,
                            length,
                            ema_period,
                            take_profit: tp,
                            stop_loss: sl,
                            max_position_lifetime: lifetime,
                        })
                    })
                })
            })
        })
    })
}
