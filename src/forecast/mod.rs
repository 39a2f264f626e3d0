//! Forecast engine: start-date solving, strategy selection and schedule generation

pub mod cache;
pub mod config;
mod engine;
pub mod range;
mod results;
mod start_date;
mod state;
pub mod strategy;

pub use cache::{ScheduleCache, ScheduleKey};
pub use config::{parse_start_month, ForecastConfig, TailWindow};
pub use engine::ForecastEngine;
pub use range::{calculate_range_schedule, RangeLoan, RangeRequest};
pub use results::{ForecastPoint, ForecastRecord, ForecastSummary, LoanForecastResult};
pub use start_date::StartDateSolver;
pub use state::{SchedulePhase, ScheduleState};
pub use strategy::{ForecastStrategy, LinearStrategy, SigmoidStrategy, StrategyRegistry};
