//! Month-by-month schedule generator for back-solved loan forecasts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::config::ForecastConfig;
use super::results::{ForecastPoint, LoanForecastResult};
use super::start_date::StartDateSolver;
use super::state::ScheduleState;
use super::strategy::{ForecastStrategy, StrategyRegistry};
use crate::curve::round_money;
use crate::dates;
use crate::error::LoanRejection;
use crate::loan::LoanRecord;

/// Main forecast engine
///
/// The strategy is resolved once at construction, so every loan in a run
/// is projected with the same curve.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    strategy: Arc<dyn ForecastStrategy>,
    solver: StartDateSolver,
    config: ForecastConfig,
}

impl ForecastEngine {
    /// Create an engine, resolving `config.strategy` against `registry`
    pub fn new(registry: &StrategyRegistry, config: ForecastConfig) -> Self {
        let strategy = registry.resolve(&config.strategy);
        Self::with_strategy(strategy, config)
    }

    /// Create an engine around an already-resolved strategy
    pub fn with_strategy(strategy: Arc<dyn ForecastStrategy>, config: ForecastConfig) -> Self {
        Self {
            strategy,
            solver: StartDateSolver::new(config.calibration_target),
            config,
        }
    }

    pub fn strategy(&self) -> &dyn ForecastStrategy {
        self.strategy.as_ref()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// First month forced to zero for a loan with this extended date
    pub fn cutoff_month(&self, extended: NaiveDate) -> NaiveDate {
        dates::month_start(self.config.tail_window.apply(extended))
    }

    /// Last month of the schedule: the month after the cutoff month
    pub fn forecast_end(&self, extended: NaiveDate) -> NaiveDate {
        let cutoff = self.cutoff_month(extended);
        dates::add_months(cutoff, 1).unwrap_or(cutoff)
    }

    /// Validate a loan, then project it
    pub fn forecast_loan(
        &self,
        loan: &LoanRecord,
        forecast_start: NaiveDate,
    ) -> Result<LoanForecastResult, LoanRejection> {
        loan.validate()?;
        Ok(self.project_loan(loan, forecast_start))
    }

    /// Run the schedule for a single loan.
    ///
    /// The loan is assumed valid; see [`ForecastEngine::forecast_loan`].
    pub fn project_loan(&self, loan: &LoanRecord, forecast_start: NaiveDate) -> LoanForecastResult {
        let forecast_start = dates::month_start(forecast_start);
        let extended = loan.extended_date;
        let completion = loan.completion_f64();

        let project_start = self.solver.solve(completion, forecast_start, extended);
        let cutoff_month = self.cutoff_month(extended);
        let end_month = self.forecast_end(extended);

        let mut result = LoanForecastResult::new(loan.clone(), project_start, end_month);
        let mut state = ScheduleState::new(forecast_start, end_month, cutoff_month, loan.outstanding_balance);

        while !state.is_terminal() {
            let month = state.current_month;
            let raw = if state.past_cutoff() {
                Decimal::ZERO
            } else {
                self.strategy.calculate(
                    loan.outstanding_balance,
                    loan.undisbursed_amount,
                    completion,
                    project_start,
                    month,
                    extended,
                )
            };

            let balance = round_money(raw);
            let delta = state.advance(balance);
            log::debug!(
                "Loan {} {}: balance {} delta {}",
                loan.loan_number,
                dates::month_label(month),
                balance,
                delta
            );
            result.add_point(ForecastPoint::new(month, balance, delta), raw);
        }

        result.finish();
        log::debug!(
            "Loan {} forecast: {} months, start {}, end {}, total {}",
            loan.loan_number,
            result.forecast_months(),
            project_start,
            end_month,
            result.total_forecasted_amount
        );
        result
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(&StrategyRegistry::builtin(), ForecastConfig::default())
    }
}
