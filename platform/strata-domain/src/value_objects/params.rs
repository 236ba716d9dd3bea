use crate::error::SweepError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed set of strategy variants. Selection by string key happens once at
/// startup; everything after that is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyVariant {
    PumpShort,
    DropLong,
    GridLong,
    EmaBreakout,
}

impl StrategyVariant {
    pub fn parse(raw: &str) -> Result<Self, SweepError> {
        match raw.trim().to_lowercase().as_str() {
            "pump-short" => Ok(Self::PumpShort),
            "drop-long" => Ok(Self::DropLong),
            "grid-long" => Ok(Self::GridLong),
            "ema-breakout" => Ok(Self::EmaBreakout),
            _ => Err(SweepError::UnknownVariant(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PumpShort => "pump-short",
            Self::DropLong => "drop-long",
            Self::GridLong => "grid-long",
            Self::EmaBreakout => "ema-breakout",
        }
    }
}

impl std::fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-tagged parameter set. Immutable once constructed; one value per
/// simulation run. Percent and money fields are decimals, bar counts are
/// indices into the candle series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum StrategyParams {
    PumpShort(PumpShortParams),
    DropLong(DropLongParams),
    GridLong(GridLongParams),
    EmaBreakout(EmaBreakoutParams),
}

impl StrategyParams {
    pub fn variant(&self) -> StrategyVariant {
        match self {
            Self::PumpShort(_) => StrategyVariant::PumpShort,
            Self::DropLong(_) => StrategyVariant::DropLong,
            Self::GridLong(_) => StrategyVariant::GridLong,
            Self::EmaBreakout(_) => StrategyVariant::EmaBreakout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PumpShortParams {
    pub position_volume: Decimal,
    /// Minimum % close-over-close growth across `duration` bars that opens a short.
    pub pump_percent: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Lookback window in bars.
    pub duration: usize,
    /// Cooldown bars after an exit.
    pub break_time: usize,
    pub max_position_lifetime: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropLongParams {
    pub position_volume: Decimal,
    /// Minimum % fall from the lookback bar's high that opens a long.
    pub drop_percent: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub duration: usize,
    pub break_time: usize,
    pub max_position_lifetime: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridLongParams {
    pub first_position_volume: Decimal,
    /// Geometric volume multiplier per level.
    pub position_volume_ratio: Decimal,
    /// % below the anchor close for the first level.
    pub distance_to_first_order: Decimal,
    /// % per averaging step.
    pub averaging_step: Decimal,
    /// Multiplier applied to the step per level index.
    pub averaging_step_ratio: Decimal,
    pub number_of_averaging_steps: usize,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub break_time: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmaBreakoutParams {
    pub position_volume: Decimal,
    /// Prior-window length in bars for the breakout levels.
    pub length: usize,
    pub ema_period: usize,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub max_position_lifetime: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_variant_accepts_known_keys() {
        assert_eq!(
            StrategyVariant::parse("pump-short").unwrap(),
            StrategyVariant::PumpShort
        );
        assert_eq!(
            StrategyVariant::parse(" Grid-Long ").unwrap(),
            StrategyVariant::GridLong
        );
    }

    #[test]
    fn parse_variant_rejects_unknown_key() {
        let err = StrategyVariant::parse("mean-reversion").unwrap_err();
        assert!(err.to_string().contains("mean-reversion"));
    }

    #[test]
    fn params_round_trip_with_variant_tag() {
        let params = StrategyParams::PumpShort(PumpShortParams {
            position_volume: dec!(100),
            pump_percent: dec!(3),
            take_profit: dec!(2),
            stop_loss: dec!(1),
            duration: 10,
            break_time: 15,
            max_position_lifetime: 30000,
        });
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"variant\":\"pump-short\""));
        let back: StrategyParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
