//! Forecast output structures

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::curve::round_money;
use crate::dates;
use crate::loan::LoanRecord;

/// One month of a loan's projected balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// First day of the calendar month
    pub month: NaiveDate,

    /// Projected outstanding balance, rounded to cents
    pub balance: Decimal,

    /// Increase over the previous month, floored at zero
    pub delta: Decimal,
}

impl ForecastPoint {
    pub fn new(month: NaiveDate, balance: Decimal, delta: Decimal) -> Self {
        Self { month, balance, delta }
    }

    /// `MMM-yy` column label
    pub fn label(&self) -> String {
        dates::month_label(self.month)
    }
}

/// Complete forecast for a single loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanForecastResult {
    /// The loan the forecast was run for
    pub loan: LoanRecord,

    /// Back-solved construction start used for time progress
    pub project_start_date: NaiveDate,

    /// Last month of the schedule
    pub forecast_end_date: NaiveDate,

    /// Monthly points in calendar order
    pub points: Vec<ForecastPoint>,

    /// Sum of monthly projected balances, rounded once at the end
    pub total_forecasted_amount: Decimal,

    /// Sum of monthly deltas
    pub total_monthly_deltas: Decimal,
}

impl LoanForecastResult {
    pub fn new(loan: LoanRecord, project_start_date: NaiveDate, forecast_end_date: NaiveDate) -> Self {
        Self {
            loan,
            project_start_date,
            forecast_end_date,
            points: Vec::new(),
            total_forecasted_amount: Decimal::ZERO,
            total_monthly_deltas: Decimal::ZERO,
        }
    }

    /// Add a month; `raw_balance` is the unrounded projection
    pub fn add_point(&mut self, point: ForecastPoint, raw_balance: Decimal) {
        self.total_forecasted_amount = self.total_forecasted_amount.saturating_add(raw_balance);
        self.total_monthly_deltas = self.total_monthly_deltas.saturating_add(point.delta);
        self.points.push(point);
    }

    /// Round the accumulated totals once the schedule is complete
    pub fn finish(&mut self) {
        self.total_forecasted_amount = round_money(self.total_forecasted_amount);
        self.total_monthly_deltas = round_money(self.total_monthly_deltas);
    }

    pub fn forecast_months(&self) -> usize {
        self.points.len()
    }

    /// Ordered `MMM-yy` → balance map
    pub fn forecast_data(&self) -> IndexMap<String, Decimal> {
        self.points.iter().map(|p| (p.label(), p.balance)).collect()
    }

    /// Balance for a given month, if the schedule covers it
    pub fn balance_at(&self, month: NaiveDate) -> Option<Decimal> {
        let month = dates::month_start(month);
        self.points.iter().find(|p| p.month == month).map(|p| p.balance)
    }

    pub fn summary(&self) -> ForecastSummary {
        let peak_balance = self
            .points
            .iter()
            .map(|p| p.balance)
            .max()
            .unwrap_or(Decimal::ZERO);
        let first_zero_month = self
            .points
            .iter()
            .find(|p| p.balance.is_zero())
            .map(|p| p.month);

        ForecastSummary {
            loan_number: self.loan.loan_number.clone(),
            forecast_months: self.points.len(),
            total_forecasted_amount: self.total_forecasted_amount,
            total_monthly_deltas: self.total_monthly_deltas,
            peak_balance,
            first_zero_month,
        }
    }
}

/// Summary statistics for one loan's forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub loan_number: String,
    pub forecast_months: usize,
    pub total_forecasted_amount: Decimal,
    pub total_monthly_deltas: Decimal,
    pub peak_balance: Decimal,
    /// First month forced to zero by the tail cutoff
    pub first_zero_month: Option<NaiveDate>,
}

/// Wire shape handed to report writers: loan fields plus the month map
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub loan_number: String,
    pub customer_name: String,
    pub property_type: String,
    pub loan_amount: Decimal,
    pub outstanding_balance: Decimal,
    pub undisbursed_amount: Decimal,
    pub percent_of_loan_drawn: Decimal,
    pub percent_of_completion: Decimal,
    pub maturity_date: NaiveDate,
    pub extended_date: NaiveDate,
    pub forecast_data: IndexMap<String, Decimal>,
    pub total_forecasted_amount: Decimal,
    pub forecast_months: usize,
}

impl From<&LoanForecastResult> for ForecastRecord {
    fn from(result: &LoanForecastResult) -> Self {
        let loan = &result.loan;
        Self {
            loan_number: loan.loan_number.clone(),
            customer_name: loan.customer_name.clone(),
            property_type: loan.property_type.clone(),
            loan_amount: loan.loan_amount,
            outstanding_balance: loan.outstanding_balance,
            undisbursed_amount: loan.undisbursed_amount,
            percent_of_loan_drawn: loan.percent_of_loan_drawn * Decimal::ONE_HUNDRED,
            percent_of_completion: loan.completion * Decimal::ONE_HUNDRED,
            maturity_date: loan.maturity_date,
            extended_date: loan.extended_date,
            forecast_data: result.forecast_data(),
            total_forecasted_amount: result.total_forecasted_amount,
            forecast_months: result.forecast_months(),
        }
    }
}
