//! Month cursor for a single loan's schedule

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dates;

/// Where the schedule walk currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    /// Months remain before the forecast end
    Iterating,
    /// The cursor has passed the forecast end
    Terminal,
}

/// State of the schedule walk between two months
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Month about to be projected (first of month)
    pub current_month: NaiveDate,

    /// Last month to project (first of month, inclusive)
    pub end_month: NaiveDate,

    /// First month forced to zero by the tail cutoff
    pub cutoff_month: NaiveDate,

    /// Rounded balance of the previous month; the delta baseline
    pub previous_balance: Decimal,

    /// Months emitted so far
    pub months_generated: u32,
}

impl ScheduleState {
    /// Start the walk at the month containing `forecast_start`
    pub fn new(
        forecast_start: NaiveDate,
        end_month: NaiveDate,
        cutoff_month: NaiveDate,
        opening_balance: Decimal,
    ) -> Self {
        Self {
            current_month: dates::month_start(forecast_start),
            end_month,
            cutoff_month,
            previous_balance: opening_balance,
            months_generated: 0,
        }
    }

    pub fn phase(&self) -> SchedulePhase {
        if self.current_month > self.end_month {
            SchedulePhase::Terminal
        } else {
            SchedulePhase::Iterating
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() == SchedulePhase::Terminal
    }

    /// Whether the current month is at or past the tail cutoff
    pub fn past_cutoff(&self) -> bool {
        self.current_month >= self.cutoff_month
    }

    /// Record `balance` for the current month and step forward.
    ///
    /// Returns the month-over-month delta, floored at zero.
    pub fn advance(&mut self, balance: Decimal) -> Decimal {
        let delta = balance.saturating_sub(self.previous_balance).max(Decimal::ZERO);
        self.previous_balance = balance;
        self.months_generated += 1;
        // Overflow past the calendar's end simply terminates the walk
        self.current_month = dates::add_months(self.current_month, 1).unwrap_or(NaiveDate::MAX);
        delta
    }
}
