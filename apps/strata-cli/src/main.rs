use chrono::{Duration, Months, Utc};
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use strata_application::config::{load_config, Config};
use strata_application::configs;
use strata_application::sweep::{run_sweep, SweepOptions};
use strata_domain::error::SweepError;
use strata_domain::repositories::market_data::{CandleQuery, MarketDataRepository};
use strata_domain::repositories::results::ResultSink;
use strata_domain::services::engine;
use strata_domain::value_objects::params::StrategyVariant;
use strata_infrastructure::market_data::HttpMarketDataRepository;
use strata_infrastructure::results::FilesystemResultSink;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Parameter sweep runner for Strata trading strategies")]
struct Args {
    /// Path to the sweep config TOML.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the strategy variant from the config (e.g. pump-short).
    #[arg(long)]
    strategy: Option<String>,

    /// Print a single JSON status line instead of human output.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Prometheus metrics listen addr (e.g. 127.0.0.1:9898). Optional.
    #[arg(long)]
    metrics_addr: Option<String>,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = init_tracing() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    let metrics_addr = args
        .metrics_addr
        .clone()
        .or_else(|| std::env::var("STRATA_METRICS_ADDR").ok());
    if let Err(err) = init_metrics(metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<(), String> {
    let filter = std::env::var("STRATA_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = metrics_addr else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid --metrics-addr (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    if metrics_addr.is_some() {
        return Err("metrics exporter requires strata-cli feature `prometheus`".to_string());
    }
    Ok(None)
}

fn run(args: &Args) -> Result<(), SweepError> {
    let config = load_config(&args.config)?;
    let variant = match &args.strategy {
        Some(raw) => StrategyVariant::parse(raw)?,
        None => config.run.strategy,
    };

    let candles = fetch_history(&config, variant)?;
    let candidates = configs::load_or_generate(
        variant,
        config.costs.position_volume,
        config.sweep.target_count,
        config.sweep.config_file.as_deref().map(Path::new),
    );

    let commission_fee = config.costs.commission_fee;
    let evaluator =
        |params: &strata_domain::value_objects::params::StrategyParams| {
            engine::backtest(params, &candles, commission_fee)
        };

    let outcome = run_sweep(
        &candidates,
        &evaluator,
        SweepOptions {
            workers: None,
            batch_size: config.sweep.batch_size(),
            reserved_cores: config.sweep.reserved_cores(),
        },
    )?;

    metrics::gauge!("strata.cli.kept_results").set(outcome.results.len() as f64);
    metrics::gauge!("strata.cli.candles").set(candles.len() as f64);

    if outcome.results.is_empty() {
        tracing::warn!(
            evaluated = outcome.evaluated,
            rejected = outcome.rejected,
            "no qualifying configuration found"
        );
    }

    let sink = FilesystemResultSink::new();
    let out_dir = PathBuf::from(&config.paths.out_dir);
    let artifact_name = format!("{}-{}", config.run.pair.to_lowercase(), variant);
    // persistence failures are reported but never discard in-memory results
    let artifact = match sink.write_ranked(&out_dir, &artifact_name, &outcome.results) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::error!(%err, "failed to persist ranked results");
            None
        }
    };

    let best_score = outcome.results.first().map(|r| r.score);
    let status = serde_json::json!({
        "strategy": variant.as_str(),
        "pair": config.run.pair,
        "candles": candles.len(),
        "candidates": candidates.len(),
        "evaluated": outcome.evaluated,
        "rejected": outcome.rejected,
        "simulation_failures": outcome.simulation_failures,
        "kept": outcome.results.len(),
        "best_score": best_score,
        "artifact": artifact.as_ref().map(|p| p.display().to_string()),
    });

    if args.json {
        println!("{status}");
    } else {
        println!(
            "{} {}: {} candles, {} candidates, {} kept{}",
            config.run.pair,
            variant,
            candles.len(),
            candidates.len(),
            outcome.results.len(),
            artifact
                .as_ref()
                .map(|p| format!(", results at {}", p.display()))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn fetch_history(
    config: &Config,
    variant: StrategyVariant,
) -> Result<Vec<strata_domain::value_objects::candle::Candle>, SweepError> {
    // pad the end forward so the freshest closed candle is always included
    let to = Utc::now() + Duration::hours(1);
    let from = to
        .checked_sub_months(Months::new(config.run.lookback_months()))
        .ok_or_else(|| SweepError::Config("history window underflows the calendar".to_string()))?;

    let repo = HttpMarketDataRepository::new(
        config.data.api_url.clone(),
        config.data.api_token.clone(),
    )?;
    let query = CandleQuery {
        symbol: config.run.pair.clone(),
        from_ms: from.timestamp_millis(),
        to_ms: to.timestamp_millis(),
        interval_minutes: config.run.interval_minutes(),
        market_type: config.run.market_type,
    };
    tracing::info!(
        pair = %query.symbol,
        strategy = %variant,
        from_ms = query.from_ms,
        to_ms = query.to_ms,
        "fetching candle history"
    );
    repo.fetch_candles(&query)
}
