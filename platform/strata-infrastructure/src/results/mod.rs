use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use strata_domain::error::SweepError;
use strata_domain::repositories::results::ResultSink;
use strata_domain::services::scoring::ScoredResult;
use strata_domain::value_objects::params::StrategyParams;

/// Writes the ranked list as a CSV plus a JSON sidecar of the bare parameter
/// sets. The sidecar is shaped so it can be fed back in as a parameter
/// override file. Existing files are never clobbered; a `-N` suffix is
/// appended until the name is free.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemResultSink;

impl FilesystemResultSink {
    pub fn new() -> Self {
        Self
    }
}

const METRIC_COLUMNS: [&str; 14] = [
    "trades",
    "wins",
    "losses",
    "win_rate",
    "net_profit",
    "commission",
    "net_with_commission",
    "gross_profit",
    "gross_loss",
    "profit_factor",
    "total_pnl_percent",
    "max_drawdown_usd",
    "max_time_in_trade",
    "avg_time_in_trade",
];

impl ResultSink for FilesystemResultSink {
    fn write_ranked(
        &self,
        dir: &Path,
        name: &str,
        results: &[ScoredResult],
    ) -> Result<PathBuf, SweepError> {
        let start = Instant::now();
        let outcome = write_ranked_inner(dir, name, results);
        let result_label = if outcome.is_ok() { "ok" } else { "err" };
        metrics::counter!(
            "strata.infra.results.write.calls_total",
            "result" => result_label
        )
        .increment(1);
        metrics::histogram!("strata.infra.results.write_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        outcome
    }
}

fn write_ranked_inner(
    dir: &Path,
    name: &str,
    results: &[ScoredResult],
) -> Result<PathBuf, SweepError> {
    fs::create_dir_all(dir).map_err(|err| {
        SweepError::Persistence(format!("failed to create dir {}: {err}", dir.display()))
    })?;

    let csv_path = unique_path(dir, name, "csv");
    let stem = csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string();

    write_csv(&csv_path, results)?;
    write_params_sidecar(&dir.join(format!("{stem}.json")), results)?;

    tracing::info!(path = %csv_path.display(), rows = results.len(), "wrote ranked results");
    Ok(csv_path)
}

fn write_csv(path: &Path, results: &[ScoredResult]) -> Result<(), SweepError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| {
        SweepError::Persistence(format!("failed to create {}: {err}", path.display()))
    })?;

    let param_columns = match results.first() {
        Some(first) => param_fields(&first.result.params)?
            .into_iter()
            .map(|(key, _)| key)
            .collect(),
        None => Vec::new(),
    };

    let mut header: Vec<String> = vec!["rank".to_string(), "score".to_string()];
    header.extend(METRIC_COLUMNS.iter().map(|c| c.to_string()));
    header.extend(param_columns.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|err| SweepError::Persistence(format!("failed to write header: {err}")))?;

    for (index, scored) in results.iter().enumerate() {
        let m = &scored.result.metrics;
        let mut record: Vec<String> = vec![
            (index + 1).to_string(),
            format!("{}", scored.score),
            m.trades.to_string(),
            m.wins.to_string(),
            m.losses.to_string(),
            m.win_rate.to_string(),
            m.net_profit.to_string(),
            m.commission.to_string(),
            m.net_with_commission.to_string(),
            m.gross_profit.to_string(),
            m.gross_loss.to_string(),
            m.profit_factor.to_string(),
            m.total_pnl_percent.to_string(),
            m.max_drawdown_usd.to_string(),
            m.max_time_in_trade.to_string(),
            format!("{}", m.avg_time_in_trade),
        ];
        let fields = param_fields(&scored.result.params)?;
        for column in &param_columns {
            let cell = fields
                .iter()
                .find(|(key, _)| key == column)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            record.push(cell);
        }
        writer
            .write_record(&record)
            .map_err(|err| SweepError::Persistence(format!("failed to write row: {err}")))?;
    }

    writer
        .flush()
        .map_err(|err| SweepError::Persistence(format!("failed to flush {}: {err}", path.display())))
}

fn write_params_sidecar(path: &Path, results: &[ScoredResult]) -> Result<(), SweepError> {
    let params: Vec<&StrategyParams> = results.iter().map(|r| &r.result.params).collect();
    let json = serde_json::to_string_pretty(&params)
        .map_err(|err| SweepError::Persistence(format!("failed to serialize params: {err}")))?;
    fs::write(path, json).map_err(|err| {
        SweepError::Persistence(format!("failed to write {}: {err}", path.display()))
    })
}

/// Flattens the variant-tagged params into sorted (column, cell) pairs. The
/// serde map preserves key order as BTreeMap order, so columns are stable
/// across rows of the same variant.
fn param_fields(params: &StrategyParams) -> Result<Vec<(String, String)>, SweepError> {
    let value = serde_json::to_value(params)
        .map_err(|err| SweepError::Persistence(format!("failed to flatten params: {err}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(SweepError::Persistence(
            "params did not flatten to an object".to_string(),
        ));
    };
    Ok(map.into_iter().map(|(k, v)| (k, scalar_to_cell(v))).collect())
}

fn scalar_to_cell(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn unique_path(dir: &Path, name: &str, ext: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{name}.{ext}"));
    let mut suffix = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{name}-{suffix}.{ext}"));
        suffix += 1;
    }
    candidate
}
