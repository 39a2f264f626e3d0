//! Interchangeable curve strategies and the registry that selects them

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use crate::curve::{self, SCurve};
use crate::dates;

/// Strategy used when a requested name is unknown
pub const DEFAULT_STRATEGY: &str = "simple";

/// A named, stateless curve formula.
///
/// Implementations must be pure: the same inputs always give the same
/// projection. Values are returned unrounded; the schedule rounds.
pub trait ForecastStrategy: Send + Sync + fmt::Debug {
    /// Projected outstanding balance at `forecast_date`
    fn calculate(
        &self,
        outstanding: Decimal,
        undisbursed: Decimal,
        completion: f64,
        project_start: NaiveDate,
        forecast_date: NaiveDate,
        extended: NaiveDate,
    ) -> Decimal;

    /// Registry key
    fn name(&self) -> &str;

    fn description(&self) -> &str;
}

/// Logistic S-curve over blended completion/time progress
#[derive(Debug, Clone)]
pub struct SigmoidStrategy {
    name: &'static str,
    description: &'static str,
    curve: SCurve,
}

impl SigmoidStrategy {
    pub fn new(name: &'static str, description: &'static str, curve: SCurve) -> Self {
        Self { name, description, curve }
    }

    /// k = 12, m = 0.5
    pub fn simple() -> Self {
        Self::new(
            "simple",
            "Sigmoid S-curve, steepness 12, midpoint 0.5",
            SCurve::default(),
        )
    }

    /// Front-loaded draws: k = 8, m = 0.3
    pub fn optimistic() -> Self {
        Self::new(
            "optimistic",
            "Early-draw sigmoid, steepness 8, midpoint 0.3",
            SCurve::new(8.0, 0.3),
        )
    }

    /// Flatter curve: k = 4, m = 0.5
    pub fn conservative() -> Self {
        Self::new(
            "conservative",
            "Gradual sigmoid, steepness 4, midpoint 0.5",
            SCurve::new(4.0, 0.5),
        )
    }

    pub fn curve(&self) -> &SCurve {
        &self.curve
    }
}

impl ForecastStrategy for SigmoidStrategy {
    fn calculate(
        &self,
        outstanding: Decimal,
        undisbursed: Decimal,
        completion: f64,
        project_start: NaiveDate,
        forecast_date: NaiveDate,
        extended: NaiveDate,
    ) -> Decimal {
        let time_progress = dates::elapsed_fraction(project_start, forecast_date, extended);
        curve::project_balance(&self.curve, outstanding, undisbursed, completion, time_progress)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }
}

/// Straight-line draw: the undisbursed share tracks total progress directly
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearStrategy;

impl ForecastStrategy for LinearStrategy {
    fn calculate(
        &self,
        outstanding: Decimal,
        undisbursed: Decimal,
        completion: f64,
        project_start: NaiveDate,
        forecast_date: NaiveDate,
        extended: NaiveDate,
    ) -> Decimal {
        let time_progress = dates::elapsed_fraction(project_start, forecast_date, extended);
        let progress = curve::total_progress(completion, time_progress);
        curve::disbursed_balance(outstanding, undisbursed, progress)
    }

    fn name(&self) -> &str {
        "linear"
    }

    fn description(&self) -> &str {
        "Linear ramp from current completion to full disbursement"
    }
}

/// Name → strategy lookup, filled once at startup
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn ForecastStrategy>>,
}

impl StrategyRegistry {
    /// Registry holding the built-in strategies
    pub fn builtin() -> Self {
        let mut registry = Self { strategies: Vec::new() };
        registry.register(Arc::new(SigmoidStrategy::simple()));
        registry.register(Arc::new(SigmoidStrategy::optimistic()));
        registry.register(Arc::new(SigmoidStrategy::conservative()));
        registry.register(Arc::new(LinearStrategy));
        registry
    }

    /// Add a strategy, replacing any with the same name
    pub fn register(&mut self, strategy: Arc<dyn ForecastStrategy>) {
        self.strategies.retain(|s| s.name() != strategy.name());
        self.strategies.push(strategy);
    }

    /// Exact lookup (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn ForecastStrategy>> {
        let name = name.trim();
        self.strategies
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Lookup with fallback to the default strategy
    pub fn resolve(&self, name: &str) -> Arc<dyn ForecastStrategy> {
        let strategy: Arc<dyn ForecastStrategy> = match self.get(name) {
            Some(strategy) => strategy,
            None => {
                log::warn!(
                    "Algorithm type '{}' not found, falling back to {}",
                    name,
                    DEFAULT_STRATEGY
                );
                match self.get(DEFAULT_STRATEGY) {
                    Some(strategy) => strategy,
                    None => Arc::new(SigmoidStrategy::simple()),
                }
            }
        };

        log::info!(
            "Using forecast algorithm: {} - {}",
            strategy.name(),
            strategy.description()
        );
        strategy
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
