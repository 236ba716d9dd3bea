use strata_domain::services::scoring::ScoredResult;

/// Monoid reducer over batch winners. On a score tie the earlier candidate
/// wins, matching the stable ordering of [`rank`].
pub fn best_of(a: Option<ScoredResult>, b: Option<ScoredResult>) -> Option<ScoredResult> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(x), Some(y)) => Some(if y.score > x.score { y } else { x }),
    }
}

/// Sorts by score descending. Stable, so equal scores keep arrival order.
pub fn rank(mut results: Vec<ScoredResult>) -> Vec<ScoredResult> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

pub fn best(results: &[ScoredResult]) -> Option<&ScoredResult> {
    results.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use strata_domain::services::engine::{metrics, RunResult};
    use strata_domain::value_objects::params::{PumpShortParams, StrategyParams};

    fn scored(score: f64, pump_percent: rust_decimal::Decimal) -> ScoredResult {
        ScoredResult {
            result: RunResult {
                params: StrategyParams::PumpShort(PumpShortParams {
                    position_volume: dec!(100),
                    pump_percent,
                    take_profit: dec!(1),
                    stop_loss: dec!(1),
                    duration: 1,
                    break_time: 1,
                    max_position_lifetime: 30_000,
                }),
                metrics: metrics::fold(&[], rust_decimal::Decimal::ZERO),
                trades: Vec::new(),
            },
            score,
        }
    }

    #[test]
    fn best_of_prefers_higher_score() {
        let winner = best_of(Some(scored(2.0, dec!(1))), Some(scored(5.0, dec!(2)))).unwrap();
        assert_eq!(winner.score, 5.0);
    }

    #[test]
    fn best_of_keeps_first_on_tie() {
        let winner = best_of(Some(scored(3.0, dec!(1))), Some(scored(3.0, dec!(2)))).unwrap();
        let StrategyParams::PumpShort(p) = &winner.result.params else {
            panic!("wrong variant");
        };
        assert_eq!(p.pump_percent, dec!(1));
    }

    #[test]
    fn best_of_handles_missing_sides() {
        assert!(best_of(None, None).is_none());
        assert_eq!(best_of(None, Some(scored(1.0, dec!(1)))).unwrap().score, 1.0);
        assert_eq!(best_of(Some(scored(1.0, dec!(1))), None).unwrap().score, 1.0);
    }

    #[test]
    fn rank_is_idempotent() {
        let once = rank(vec![scored(1.0, dec!(1)), scored(7.0, dec!(2))]);
        let twice = rank(once.clone());
        let scores: Vec<f64> = twice.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![7.0, 1.0]);
    }

    #[test]
    fn rank_sorts_descending_and_is_stable() {
        let ranked = rank(vec![
            scored(1.0, dec!(1)),
            scored(9.0, dec!(2)),
            scored(9.0, dec!(3)),
            scored(4.0, dec!(4)),
        ]);
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![9.0, 9.0, 4.0, 1.0]);
        let StrategyParams::PumpShort(p) = &ranked[0].result.params else {
            panic!("wrong variant");
        };
        assert_eq!(p.pump_percent, dec!(2));
    }
}
