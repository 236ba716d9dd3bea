//! Parallel execution of one simulation per candidate parameter set.
//!
//! The candidate list is split into one contiguous slice per worker; each
//! worker walks its slice in batches and reports only the best accepted
//! result per batch, which bounds collector memory by the batch count
//! rather than the candidate count.

pub mod rank;

use metrics::counter;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};

use strata_domain::error::SweepError;
use strata_domain::services::engine::RunResult;
use strata_domain::services::scoring::{self, ScoredResult};
use strata_domain::value_objects::params::StrategyParams;

pub type Evaluator<'a> = dyn Fn(&StrategyParams) -> Result<RunResult, SweepError> + Sync + 'a;

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Worker thread count; `None` derives it from available parallelism
    /// minus `reserved_cores`.
    pub workers: Option<usize>,
    pub batch_size: usize,
    pub reserved_cores: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            workers: None,
            batch_size: 100,
            reserved_cores: 2,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepOutcome {
    /// Batch winners, score-descending.
    pub results: Vec<ScoredResult>,
    pub evaluated: usize,
    pub rejected: usize,
    pub simulation_failures: usize,
    pub empty_batches: usize,
}

enum WorkerMessage {
    BatchBest {
        worker_id: usize,
        batch: usize,
        best: Option<ScoredResult>,
        evaluated: usize,
        rejected: usize,
        failures: usize,
    },
    Fatal {
        worker_id: usize,
        error: String,
    },
}

pub fn run_sweep(
    configs: &[StrategyParams],
    evaluator: &Evaluator<'_>,
    options: SweepOptions,
) -> Result<SweepOutcome, SweepError> {
    if configs.is_empty() {
        return Ok(SweepOutcome::default());
    }

    let batch_size = options.batch_size.max(1);
    let worker_count = resolve_workers(&options, configs.len());
    let chunk_size = configs.len().div_ceil(worker_count);
    info!(
        total = configs.len(),
        workers = worker_count,
        batch_size,
        "starting parameter sweep"
    );

    let (tx, rx) = mpsc::channel::<WorkerMessage>();

    thread::scope(|scope| {
        for (worker_id, slice) in configs.chunks(chunk_size).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    for (batch_id, batch) in slice.chunks(batch_size).enumerate() {
                        let mut best: Option<ScoredResult> = None;
                        let mut evaluated = 0usize;
                        let mut rejected = 0usize;
                        let mut failures = 0usize;

                        for params in batch {
                            match evaluator(params) {
                                Ok(result) => {
                                    evaluated += 1;
                                    let score = scoring::score(&result);
                                    if score == f64::NEG_INFINITY {
                                        rejected += 1;
                                        continue;
                                    }
                                    best = rank::best_of(best, Some(ScoredResult { result, score }));
                                }
                                Err(err) => {
                                    failures += 1;
                                    debug!(worker_id, %err, "simulation failed, skipping candidate");
                                }
                            }
                        }

                        let sent = tx.send(WorkerMessage::BatchBest {
                            worker_id,
                            batch: batch_id,
                            best,
                            evaluated,
                            rejected,
                            failures,
                        });
                        if sent.is_err() {
                            break;
                        }
                    }
                }));
                if let Err(payload) = run {
                    let _ = tx.send(WorkerMessage::Fatal {
                        worker_id,
                        error: panic_message(payload),
                    });
                }
            });
        }
        drop(tx);

        let mut outcome = SweepOutcome::default();
        // winners keyed by (worker, batch) so that score ties rank in
        // candidate order rather than message arrival order
        let mut winners: Vec<(usize, usize, ScoredResult)> = Vec::new();
        let mut fatal: Option<(usize, String)> = None;

        while let Ok(message) = rx.recv() {
            match message {
                WorkerMessage::BatchBest {
                    worker_id,
                    batch,
                    best,
                    evaluated,
                    rejected,
                    failures,
                } => {
                    outcome.evaluated += evaluated;
                    outcome.rejected += rejected;
                    outcome.simulation_failures += failures;
                    match best {
                        Some(winner) => winners.push((worker_id, batch, winner)),
                        None => outcome.empty_batches += 1,
                    }
                }
                WorkerMessage::Fatal { worker_id, error } => {
                    if fatal.is_none() {
                        fatal = Some((worker_id, error));
                    }
                }
            }
        }

        if let Some((worker_id, error)) = fatal {
            return Err(SweepError::WorkerFailure(format!(
                "worker {worker_id} panicked: {error}"
            )));
        }

        counter!("sweep_configs_evaluated_total").increment(outcome.evaluated as u64);
        counter!("sweep_configs_rejected_total").increment(outcome.rejected as u64);
        counter!("sweep_simulation_failures_total").increment(outcome.simulation_failures as u64);

        winners.sort_by_key(|(worker_id, batch, _)| (*worker_id, *batch));
        outcome.results = rank::rank(winners.into_iter().map(|(_, _, w)| w).collect());
        info!(
            evaluated = outcome.evaluated,
            rejected = outcome.rejected,
            failures = outcome.simulation_failures,
            kept = outcome.results.len(),
            "sweep finished"
        );
        Ok(outcome)
    })
}

fn resolve_workers(options: &SweepOptions, total: usize) -> usize {
    let requested = options.workers.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .saturating_sub(options.reserved_cores)
    });
    requested.max(1).min(total)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
