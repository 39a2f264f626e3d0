//! Loan Forecast - S-curve disbursement forecasting for construction loans
//!
//! This library provides:
//! - Loan tape loading and lenient normalization
//! - Sigmoid disbursement curve with interchangeable strategies
//! - Back-solved project start dates and monthly balance schedules
//! - Explicit-range schedules with a concurrent read-through cache
//! - Parallel batch runs and portfolio roll-ups

pub mod batch;
pub mod curve;
pub mod dates;
pub mod error;
pub mod forecast;
pub mod loan;
pub mod portfolio;
pub mod report;

// Re-export commonly used types
pub use batch::{BatchOutcome, BatchRunner};
pub use curve::SCurve;
pub use error::{LoanRejection, LoaderError};
pub use forecast::{ForecastConfig, ForecastEngine, ForecastPoint, LoanForecastResult, StrategyRegistry, TailWindow};
pub use loan::{LoanRecord, Normalizer, RawLoanRecord};
pub use portfolio::PortfolioSummary;
