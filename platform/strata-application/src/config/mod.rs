use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use strata_domain::error::SweepError;
use strata_domain::repositories::market_data::MarketType;
use strata_domain::value_objects::params::StrategyVariant;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub sweep: SweepConfig,
    pub costs: CostsConfig,
    pub data: DataConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub strategy: StrategyVariant,
    pub pair: String,
    pub market_type: MarketType,
    pub interval_minutes: Option<u32>,
    pub years_back: Option<u32>,
    pub months_back: Option<u32>,
}

impl RunConfig {
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes.unwrap_or(1).max(1)
    }

    /// Total history window in months.
    pub fn lookback_months(&self) -> u32 {
        self.years_back.unwrap_or(0) * 12 + self.months_back.unwrap_or(0)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub batch_size: Option<usize>,
    pub target_count: Option<usize>,
    pub reserved_cores: Option<usize>,
    /// Optional JSON file of explicit parameter sets that bypasses generation.
    pub config_file: Option<String>,
}

impl SweepConfig {
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(100).max(1)
    }

    pub fn reserved_cores(&self) -> usize {
        self.reserved_cores.unwrap_or(2)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CostsConfig {
    /// Per-side commission as a fraction of notional (e.g. 0.0005 = 5 bps).
    pub commission_fee: Decimal,
    pub position_volume: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub api_url: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

pub fn load_config(path: &Path) -> Result<Config, SweepError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        SweepError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    let config: Config = toml::from_str(&raw).map_err(|err| {
        SweepError::Config(format!("failed to parse config TOML {}: {err}", path.display()))
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), SweepError> {
    if config.run.lookback_months() == 0 {
        return Err(SweepError::Config(
            "run.years_back/run.months_back must cover at least one month".to_string(),
        ));
    }
    if config.run.pair.trim().is_empty() {
        return Err(SweepError::Config("run.pair cannot be empty".to_string()));
    }
    if config.costs.position_volume <= Decimal::ZERO {
        return Err(SweepError::Config(
            "costs.position_volume must be positive".to_string(),
        ));
    }
    if config.costs.commission_fee < Decimal::ZERO {
        return Err(SweepError::Config(
            "costs.commission_fee cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
[run]
strategy = "pump-short"
pair = "BTCUSDT"
market_type = "futures"
months_back = 6

[sweep]
target_count = 500

[costs]
commission_fee = 0.0005
position_volume = 100

[data]
api_url = "http://127.0.0.1:8100"
api_token = "secret"

[paths]
out_dir = "runs_out"
"#;

    fn parse(raw: &str) -> Result<Config, SweepError> {
        let config: Config = toml::from_str(raw)
            .map_err(|err| SweepError::Config(err.to_string()))?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn sample_config_parses_with_defaults() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.run.strategy, StrategyVariant::PumpShort);
        assert_eq!(config.run.interval_minutes(), 1);
        assert_eq!(config.run.lookback_months(), 6);
        assert_eq!(config.sweep.batch_size(), 100);
        assert_eq!(config.sweep.reserved_cores(), 2);
        assert_eq!(config.sweep.target_count, Some(500));
        assert_eq!(config.costs.position_volume, dec!(100));
    }

    #[test]
    fn years_and_months_combine() {
        let raw = SAMPLE.replace("months_back = 6", "years_back = 2\nmonths_back = 3");
        let config = parse(&raw).unwrap();
        assert_eq!(config.run.lookback_months(), 27);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let raw = SAMPLE.replace("[sweep]", "[sweep]\nshuffle = true");
        assert!(parse(&raw).is_err());
    }

    #[test]
    fn empty_history_window_is_rejected() {
        let raw = SAMPLE.replace("months_back = 6", "months_back = 0");
        let err = parse(&raw).unwrap_err();
        assert!(err.to_string().contains("at least one month"));
    }

    #[test]
    fn non_positive_volume_is_rejected() {
        let raw = SAMPLE.replace("position_volume = 100", "position_volume = 0");
        assert!(parse(&raw).is_err());
    }
}
