//! Explicit-range schedules for interactive recompute
//!
//! Unlike the batch engine this variant knows the loan's real start date,
//! so no start is back-solved. Cumulative balances run over a caller-chosen
//! `[from, to]` window.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::results::ForecastPoint;
use crate::curve::{self, round_money, SCurve};
use crate::dates;

/// Days after the end date before balances are forced to zero
pub const RANGE_CUTOFF_DAYS: i64 = 181;

/// Loan attributes for a range query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeLoan {
    pub loan_id: String,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    /// Replaces the maturity date as the end of the draw period when set
    pub extended_date: Option<NaiveDate>,
    pub loan_amount: Decimal,
    pub outstanding_balance: Decimal,
    /// Latest reported completion as a fraction
    pub completion: Decimal,
}

impl RangeLoan {
    /// Extended date if present, else maturity
    pub fn end_date(&self) -> NaiveDate {
        self.extended_date.unwrap_or(self.maturity_date)
    }

    /// Last date that still carries a projected balance
    pub fn cutoff_date(&self) -> NaiveDate {
        let end = self.end_date();
        dates::offset_days(end, RANGE_CUTOFF_DAYS).unwrap_or(NaiveDate::MAX)
    }

    pub fn undisbursed(&self) -> Decimal {
        self.loan_amount.saturating_sub(self.outstanding_balance)
    }
}

/// Window and overrides for a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// What-if completion replacing the loan's reported value
    pub completion_override: Option<Decimal>,
}

impl RangeRequest {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            completion_override: None,
        }
    }

    pub fn with_completion(mut self, completion: Decimal) -> Self {
        self.completion_override = Some(completion);
        self
    }
}

/// Cumulative balance schedule for `loan` over `request`'s window.
///
/// Months run from the first of `from`'s month while `month <= to`.
/// Months strictly after the cutoff date carry a zero balance and delta.
pub fn calculate_range_schedule(loan: &RangeLoan, request: &RangeRequest) -> Vec<ForecastPoint> {
    let curve = SCurve::default();
    let end = loan.end_date();
    let cutoff = loan.cutoff_date();
    let undisbursed = loan.undisbursed();
    let completion = request
        .completion_override
        .unwrap_or(loan.completion)
        .to_f64()
        .unwrap_or(0.0);

    let mut schedule = Vec::new();
    let mut previous = Decimal::ZERO;
    let mut month = dates::month_start(request.from);

    while month <= request.to {
        if month > cutoff {
            schedule.push(ForecastPoint::new(month, Decimal::ZERO, Decimal::ZERO));
        } else {
            let time_progress = dates::elapsed_fraction(loan.start_date, month, end);
            let cumulative = round_money(curve::project_balance(
                &curve,
                loan.outstanding_balance,
                undisbursed,
                completion,
                time_progress,
            ));
            let delta = cumulative.saturating_sub(previous).max(Decimal::ZERO);
            schedule.push(ForecastPoint::new(month, cumulative, delta));
            previous = cumulative;
        }

        month = match dates::add_months(month, 1) {
            Some(next) => next,
            None => break,
        };
    }

    log::debug!(
        "Range schedule for {}: {} months from {} to {}",
        loan.loan_id,
        schedule.len(),
        request.from,
        request.to
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_loan() -> RangeLoan {
        RangeLoan {
            loan_id: "LN-001".to_string(),
            start_date: date(2024, 1, 1),
            maturity_date: date(2024, 12, 31),
            extended_date: None,
            loan_amount: dec!(1000000.00),
            outstanding_balance: dec!(0),
            completion: dec!(0),
        }
    }

    #[test]
    fn test_first_cumulative_value() {
        let request = RangeRequest::new(date(2024, 1, 1), date(2025, 1, 1));
        let schedule = calculate_range_schedule(&test_loan(), &request);

        assert_eq!(schedule.len(), 13);
        assert_eq!(schedule[0].balance, dec!(2472.62));
        assert_eq!(schedule[0].delta, dec!(2472.62));
        assert!(schedule.last().unwrap().balance <= dec!(1000000.00));
    }

    #[test]
    fn test_cumulative_never_decreases_before_cutoff() {
        let request = RangeRequest::new(date(2024, 1, 1), date(2025, 6, 1));
        let schedule = calculate_range_schedule(&test_loan(), &request);

        for pair in schedule.windows(2) {
            assert!(pair[1].balance >= pair[0].balance);
        }
    }

    #[test]
    fn test_after_cutoff_deltas_are_zero() {
        let mut loan = test_loan();
        loan.completion = dec!(1.0);
        loan.outstanding_balance = loan.loan_amount;

        let request = RangeRequest::new(date(2026, 7, 1), date(2026, 8, 1));
        let schedule = calculate_range_schedule(&loan, &request);

        assert_eq!(schedule.len(), 2);
        for point in &schedule {
            assert_eq!(point.delta, dec!(0.00));
            assert_eq!(point.balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_extended_date_replaces_maturity() {
        let mut loan = test_loan();
        loan.extended_date = Some(date(2025, 12, 31));
        assert_eq!(loan.end_date(), date(2025, 12, 31));
        assert_eq!(loan.cutoff_date(), date(2026, 6, 30));

        // Slower time progress with the later end date
        let request = RangeRequest::new(date(2024, 6, 1), date(2024, 6, 30));
        let extended = calculate_range_schedule(&loan, &request);
        let original = calculate_range_schedule(&test_loan(), &request);
        assert!(extended[0].balance < original[0].balance);
    }

    #[test]
    fn test_completion_override() {
        let request = RangeRequest::new(date(2024, 1, 1), date(2024, 1, 31)).with_completion(dec!(0.5));
        let schedule = calculate_range_schedule(&test_loan(), &request);
        // Total progress 0.5 sits on the curve midpoint
        assert_eq!(schedule[0].balance, dec!(500000.00));
    }

    #[test]
    fn test_start_equals_end_uses_zero_time_progress() {
        let mut loan = test_loan();
        loan.maturity_date = loan.start_date;
        let request = RangeRequest::new(date(2024, 1, 1), date(2024, 3, 1));
        let schedule = calculate_range_schedule(&loan, &request);
        assert!(schedule.iter().all(|p| p.balance == dec!(2472.62)));
        assert_eq!(schedule[1].delta, Decimal::ZERO);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let request = RangeRequest::new(date(2025, 1, 1), date(2024, 1, 1));
        assert!(calculate_range_schedule(&test_loan(), &request).is_empty());
    }
}
