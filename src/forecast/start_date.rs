//! Back-solve an implied project start date
//!
//! Loan tapes carry completion and the extended date but no construction
//! start. The solver places the start so that, at the forecast start date,
//! the blended total progress lands on a calibration target.

use chrono::NaiveDate;

use super::config::DEFAULT_CALIBRATION_TARGET;
use crate::dates;

/// Time ratio used when the calibrated ratio degenerates
const FALLBACK_TIME_RATIO: f64 = 0.1;

/// Minimum lead of the target over current completion
const COMPLETION_BUMP: f64 = 0.01;

/// Project-start-date solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartDateSolver {
    calibration_target: f64,
}

impl StartDateSolver {
    pub fn new(calibration_target: f64) -> Self {
        Self { calibration_target }
    }

    pub fn calibration_target(&self) -> f64 {
        self.calibration_target
    }

    /// Fraction of the start-to-extended window that should already have
    /// elapsed at the forecast start
    pub fn time_ratio(&self, completion: f64) -> f64 {
        let target = self.calibration_target.max(completion + COMPLETION_BUMP);
        let ratio = (target - completion) / (1.0 - completion);
        if !ratio.is_finite() || ratio >= 1.0 {
            FALLBACK_TIME_RATIO
        } else {
            ratio
        }
    }

    /// Implied project start for a loan at `completion` with the given
    /// extended date, as seen from `forecast_start`
    pub fn solve(&self, completion: f64, forecast_start: NaiveDate, extended: NaiveDate) -> NaiveDate {
        let ratio = self.time_ratio(completion);
        let remaining_days = dates::days_between(forecast_start, extended) as f64;
        // Half-up rounding, matching the tape's day counts
        let days_back = (remaining_days * ratio / (1.0 - ratio) + 0.5).floor() as i64;

        let start = dates::offset_days(forecast_start, -days_back).unwrap_or(forecast_start);
        log::debug!(
            "Project start {} (completion {:.4}, ratio {:.4}, {} days back from {})",
            start,
            completion,
            ratio,
            days_back,
            forecast_start
        );
        start
    }
}

impl Default for StartDateSolver {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_TARGET)
    }
}
