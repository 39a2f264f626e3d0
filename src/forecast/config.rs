//! Forecast run configuration and environment overrides

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::dates;

/// Environment variable naming the curve strategy; wins over configuration
pub const ALGORITHM_ENV: &str = "FORECAST_ALGORITHM_TYPE";

/// Environment variable for the tail window (`6m`, `181d`, ...)
pub const TAIL_WINDOW_ENV: &str = "FORECAST_TAIL_WINDOW";

/// Environment variable for the start-date calibration target
pub const CALIBRATION_ENV: &str = "FORECAST_CALIBRATION_TARGET";

/// Total progress the start-date solver aims for at the forecast start
pub const DEFAULT_CALIBRATION_TARGET: f64 = 0.125;

/// Grace period after the extended date before balances are forced to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailWindow {
    /// Fixed number of days
    Days(u32),
    /// Whole calendar months
    CalendarMonths(u32),
}

impl TailWindow {
    /// `extended + window`
    pub fn apply(&self, extended: NaiveDate) -> NaiveDate {
        let shifted = match *self {
            TailWindow::Days(days) => dates::offset_days(extended, days as i64),
            TailWindow::CalendarMonths(months) => dates::add_months(extended, months),
        };
        shifted.unwrap_or(NaiveDate::MAX)
    }
}

impl Default for TailWindow {
    fn default() -> Self {
        TailWindow::CalendarMonths(6)
    }
}

impl fmt::Display for TailWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailWindow::Days(days) => write!(f, "{}d", days),
            TailWindow::CalendarMonths(months) => write!(f, "{}m", months),
        }
    }
}

impl FromStr for TailWindow {
    type Err = String;

    /// `181d`, `6m`, `181 days`, `6 months`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        let unit = s[digits.len()..].trim();
        let count: u32 = digits
            .parse()
            .map_err(|_| format!("Invalid tail window: '{}'", s))?;

        match unit {
            "d" | "day" | "days" => Ok(TailWindow::Days(count)),
            "m" | "month" | "months" => Ok(TailWindow::CalendarMonths(count)),
            other => Err(format!("Unknown tail window unit: '{}'", other)),
        }
    }
}

/// Configuration for a forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Curve strategy name looked up in the registry
    pub strategy: String,

    /// Cutoff policy after the extended date
    pub tail_window: TailWindow,

    /// Start-date solver calibration target
    pub calibration_target: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            strategy: "simple".to_string(),
            tail_window: TailWindow::default(),
            calibration_target: DEFAULT_CALIBRATION_TARGET,
        }
    }
}

impl ForecastConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FORECAST_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(name) = env::var(ALGORITHM_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            log::info!("Using algorithm type from environment variable: {}", name);
            self.strategy = name;
        }

        if let Some(window) = env::var(TAIL_WINDOW_ENV).ok().and_then(|s| s.parse().ok()) {
            self.tail_window = window;
        }

        if let Some(target) = env::var(CALIBRATION_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|t| t.is_finite() && *t > 0.0 && *t < 1.0)
        {
            self.calibration_target = target;
        }

        self
    }
}

/// Parse a forecast start month given as `YYYY-MM` or `YYYY-MM-DD`
pub fn parse_start_month(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d"))
        .ok()
        .map(dates::month_start)
}
