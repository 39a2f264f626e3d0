//! Batch runner for forecasting whole loan tapes
//!
//! Resolves the strategy once per run, then projects every loan in parallel.
//! Results come back in input order along with the counts the caller needs
//! to report success and failure.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::forecast::{ForecastConfig, ForecastEngine, LoanForecastResult, StrategyRegistry};
use crate::loan::{LoanRecord, Normalizer, RawLoanRecord, RejectedLoan};

/// Results and counts for one forecast run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Per-loan forecasts, in input order
    pub results: Vec<LoanForecastResult>,

    /// Rows excluded from the run, with the reason
    pub rejected: Vec<RejectedLoan>,

    pub total_records: usize,
    pub processed_records: usize,
    /// Always `total_records - processed_records`
    pub failed_records: usize,

    /// Wall time spent projecting
    pub elapsed: Duration,
}

impl BatchOutcome {
    fn from_parts(results: Vec<LoanForecastResult>, rejected: Vec<RejectedLoan>, elapsed: Duration) -> Self {
        let processed_records = results.len();
        let failed_records = rejected.len();
        Self {
            results,
            rejected,
            total_records: processed_records + failed_records,
            processed_records,
            failed_records,
            elapsed,
        }
    }

    /// True when every record was processed
    pub fn is_clean(&self) -> bool {
        self.failed_records == 0
    }
}

/// Batch forecast runner
///
/// Holds the strategy registry and base configuration so that many runs,
/// or many scenarios of one run, can be made without rebuilding them.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    registry: StrategyRegistry,
    config: ForecastConfig,
    /// Fixed worker count; `None` uses the global rayon pool
    threads: Option<usize>,
}

impl BatchRunner {
    /// Runner over the built-in strategies
    pub fn new(config: ForecastConfig) -> Self {
        Self::with_registry(StrategyRegistry::builtin(), config)
    }

    pub fn with_registry(registry: StrategyRegistry, config: ForecastConfig) -> Self {
        Self {
            registry,
            config,
            threads: None,
        }
    }

    /// Run on a dedicated pool of `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads).filter(|&n| n > 0);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Forecast normalized loans
    pub fn run(&self, loans: &[LoanRecord], forecast_start: NaiveDate) -> BatchOutcome {
        let engine = ForecastEngine::new(&self.registry, self.config.clone());
        self.run_with_engine(&engine, loans, forecast_start, Vec::new())
    }

    /// Normalize raw tape rows, then forecast the survivors.
    ///
    /// Rows rejected during normalization count toward `failed_records`.
    pub fn run_tape(&self, rows: &[RawLoanRecord], normalizer: &Normalizer, forecast_start: NaiveDate) -> BatchOutcome {
        let batch = normalizer.normalize_batch(rows);
        let engine = ForecastEngine::new(&self.registry, self.config.clone());
        self.run_with_engine(&engine, &batch.records, forecast_start, batch.rejected)
    }

    /// Run the same loans under several strategies for comparison
    pub fn run_scenarios(&self, loans: &[LoanRecord], forecast_start: NaiveDate, strategies: &[&str]) -> Vec<BatchOutcome> {
        strategies
            .iter()
            .map(|name| {
                let config = ForecastConfig {
                    strategy: name.to_string(),
                    ..self.config.clone()
                };
                let engine = ForecastEngine::new(&self.registry, config);
                self.run_with_engine(&engine, loans, forecast_start, Vec::new())
            })
            .collect()
    }

    fn run_with_engine(
        &self,
        engine: &ForecastEngine,
        loans: &[LoanRecord],
        forecast_start: NaiveDate,
        mut rejected: Vec<RejectedLoan>,
    ) -> BatchOutcome {
        let start = Instant::now();
        log::info!(
            "Forecasting {} loans from {} with '{}' (tail window {})",
            loans.len(),
            forecast_start,
            engine.strategy().name(),
            engine.config().tail_window
        );

        let project = || -> Vec<Result<LoanForecastResult, RejectedLoan>> {
            loans
                .par_iter()
                .map(|loan| {
                    engine.forecast_loan(loan, forecast_start).map_err(|reason| RejectedLoan {
                        loan_number: loan.loan_number.clone(),
                        reason: reason.to_string(),
                    })
                })
                .collect()
        };

        let outcomes = match self.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(project),
                Err(e) => {
                    log::warn!("Could not build {}-thread pool ({}), using global pool", threads, e);
                    project()
                }
            },
            None => project(),
        };

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(rejection) => {
                    log::warn!("Rejected loan '{}': {}", rejection.loan_number, rejection.reason);
                    rejected.push(rejection);
                }
            }
        }

        let outcome = BatchOutcome::from_parts(results, rejected, start.elapsed());
        log::info!(
            "Forecast complete: {} processed, {} failed of {} in {:?}",
            outcome.processed_records,
            outcome.failed_records,
            outcome.total_records,
            outcome.elapsed
        );
        outcome
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_loan(number: &str, outstanding: Decimal) -> LoanRecord {
        LoanRecord::new(
            number,
            dec!(800000),
            outstanding,
            dec!(500000),
            dec!(0.35),
            date(2026, 3, 31),
            date(2026, 6, 30),
        )
    }

    fn raw_row(number: &str, outstanding: &str, completion: &str) -> RawLoanRecord {
        RawLoanRecord {
            loan_number: number.to_string(),
            customer_name: "Acme Builders".to_string(),
            loan_amount: "$800,000.00".to_string(),
            maturity_date: "3/31/26".to_string(),
            extended_date: "6/30/26".to_string(),
            outstanding_balance: outstanding.to_string(),
            undisbursed_amount: "$500,000.00".to_string(),
            percent_of_completion: completion.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_negative_outstanding_counted_as_failed() {
        let loans = vec![
            test_loan("L-1", dec!(300000)),
            test_loan("L-2", dec!(-500)),
            test_loan("L-3", dec!(100000)),
        ];

        let outcome = BatchRunner::default().run(&loans, date(2025, 10, 1));

        assert_eq!(outcome.total_records, 3);
        assert_eq!(outcome.processed_records, 2);
        assert_eq!(outcome.failed_records, 1);
        assert_eq!(outcome.rejected[0].loan_number, "L-2");
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_results_keep_input_order() {
        let loans: Vec<_> = (0..50)
            .map(|i| test_loan(&format!("L-{:03}", i), Decimal::from(i * 1000)))
            .collect();

        let outcome = BatchRunner::default().with_threads(4).run(&loans, date(2025, 10, 1));

        let numbers: Vec<&str> = outcome.results.iter().map(|r| r.loan.loan_number.as_str()).collect();
        let expected: Vec<String> = (0..50).map(|i| format!("L-{:03}", i)).collect();
        assert_eq!(numbers, expected);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let loans: Vec<_> = (0..20).map(|i| test_loan(&format!("L-{}", i), dec!(250000))).collect();
        let engine = ForecastEngine::default();

        let outcome = BatchRunner::default().run(&loans, date(2025, 10, 1));
        for (loan, result) in loans.iter().zip(&outcome.results) {
            assert_eq!(result, &engine.project_loan(loan, date(2025, 10, 1)));
        }
    }

    #[test]
    fn test_empty_batch() {
        let outcome = BatchRunner::default().run(&[], date(2025, 10, 1));
        assert_eq!(outcome.total_records, 0);
        assert_eq!(outcome.processed_records, 0);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_run_tape_counts_normalization_rejects() {
        let rows = vec![
            raw_row("L-1", "$300,000.00", "35%"),
            raw_row("L-2", "N/A", "35%"),
            raw_row("L-3", "($500.00)", "140%"),
        ];
        let normalizer = Normalizer::with_today(date(2025, 10, 1));

        let outcome = BatchRunner::default().run_tape(&rows, &normalizer, date(2025, 10, 1));

        assert_eq!(outcome.total_records, 3);
        assert_eq!(outcome.processed_records, 1);
        assert_eq!(outcome.failed_records, 2);
        assert_eq!(outcome.results[0].loan.customer_name, "Acme Builders");
    }

    #[test]
    fn test_run_tape_rejects_oversized_amounts() {
        let mut huge = raw_row("L-2", "10000000000000000000000000000", "50%");
        huge.undisbursed_amount = "10000000000000000000000000000".to_string();
        huge.maturity_date = "2026-03-31".to_string();
        huge.extended_date = "2026-06-30".to_string();
        let rows = vec![raw_row("L-1", "$300,000.00", "35%"), huge];
        let normalizer = Normalizer::with_today(date(2025, 10, 1));

        let outcome = BatchRunner::default().run_tape(&rows, &normalizer, date(2025, 10, 1));

        assert_eq!(outcome.processed_records, 1);
        assert_eq!(outcome.failed_records, 1);
        assert_eq!(outcome.rejected[0].loan_number, "L-2");
        assert!(outcome.rejected[0].reason.contains("exceeds the supported maximum"));
    }

    #[test]
    fn test_run_scenarios_one_outcome_per_strategy() {
        let loans = vec![test_loan("L-1", dec!(300000))];
        let outcomes = BatchRunner::default().run_scenarios(&loans, date(2025, 10, 1), &["simple", "linear", "bogus"]);

        assert_eq!(outcomes.len(), 3);
        // Unknown name falls back to simple
        assert_eq!(outcomes[0].results, outcomes[2].results);
        assert_ne!(outcomes[0].results, outcomes[1].results);
    }
}
