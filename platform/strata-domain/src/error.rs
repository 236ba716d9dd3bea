use thiserror::Error;

/// Error taxonomy for a sweep run.
///
/// Propagation policy: `DataFetch`/`EmptyResult` abort before any simulation
/// starts, `UnknownVariant` aborts at startup, `Simulation` is absorbed per
/// configuration and never escapes a worker, `WorkerFailure` aborts the whole
/// sweep with no partial aggregation, and `Persistence` is logged by the
/// caller without touching in-memory results.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to fetch candles: {0}")]
    DataFetch(String),

    #[error("no candles returned for the requested window")]
    EmptyResult,

    #[error("unknown strategy variant '{0}' (available: pump-short, drop-long, grid-long, ema-breakout)")]
    UnknownVariant(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("sweep worker failed: {0}")]
    WorkerFailure(String),

    #[error("failed to persist results: {0}")]
    Persistence(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
