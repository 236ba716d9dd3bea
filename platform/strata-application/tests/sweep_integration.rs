use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strata_application::configs;
use strata_application::sweep::{run_sweep, SweepOptions};
use strata_domain::services::engine;
use strata_domain::value_objects::candle::Candle;
use strata_domain::value_objects::params::{StrategyParams, StrategyVariant};

fn candle(index: usize, close: Decimal) -> Candle {
    Candle {
        timestamp: index as i64 * 60_000,
        open: close,
        high: close + dec!(0.5),
        low: close - dec!(0.5),
        close,
        volume: dec!(10),
    }
}

/// Repeating pump-and-fade cycles so thresholded short entries find work.
fn pump_and_fade_series(cycles: usize) -> Vec<Candle> {
    let mut closes: Vec<Decimal> = Vec::new();
    for _ in 0..cycles {
        let mut price = dec!(100);
        for _ in 0..10 {
            closes.push(price);
        }
        for _ in 0..10 {
            price += dec!(1.5);
            closes.push(price);
        }
        for _ in 0..30 {
            price -= dec!(0.5);
            closes.push(price);
        }
    }
    closes
        .into_iter()
        .enumerate()
        .map(|(i, c)| candle(i, c))
        .collect()
}

#[test]
fn sweep_over_real_engine_produces_ranked_results() {
    let candles = pump_and_fade_series(8);
    let candidates = configs::generate(StrategyVariant::PumpShort, dec!(100), Some(400));
    let evaluator =
        |params: &StrategyParams| engine::backtest(params, &candles, dec!(0.0005));

    let outcome = run_sweep(
        &candidates,
        &evaluator,
        SweepOptions {
            workers: Some(4),
            batch_size: 50,
            reserved_cores: 0,
        },
    )
    .expect("sweep");

    assert_eq!(outcome.evaluated + outcome.simulation_failures, 400);
    assert_eq!(outcome.simulation_failures, 0);
    for pair in outcome.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for result in &outcome.results {
        assert!(result.score.is_finite());
        assert!(result.result.metrics.trades > 0);
        assert!(result.result.metrics.net_with_commission > dec!(1));
    }
}

#[test]
fn sweep_is_deterministic_across_runs() {
    let candles = pump_and_fade_series(4);
    let candidates = configs::generate(StrategyVariant::DropLong, dec!(100), Some(200));
    let evaluator =
        |params: &StrategyParams| engine::backtest(params, &candles, dec!(0.0005));
    let options = SweepOptions {
        workers: Some(3),
        batch_size: 40,
        reserved_cores: 0,
    };

    let first = run_sweep(&candidates, &evaluator, options).expect("first sweep");
    let second = run_sweep(&candidates, &evaluator, options).expect("second sweep");

    let first_scores: Vec<f64> = first.results.iter().map(|r| r.score).collect();
    let second_scores: Vec<f64> = second.results.iter().map(|r| r.score).collect();
    assert_eq!(first_scores, second_scores);
    assert_eq!(first.evaluated, second.evaluated);
    assert_eq!(first.rejected, second.rejected);
}
