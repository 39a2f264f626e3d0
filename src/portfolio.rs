//! Portfolio roll-up of per-loan forecasts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dates;
use crate::forecast::LoanForecastResult;

/// Property type used when a loan has none
const UNKNOWN_PROPERTY_TYPE: &str = "Unknown";

/// Portfolio totals for a single month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// Sum of projected balances
    pub balance: Decimal,
    /// Sum of monthly deltas (new disbursement)
    pub delta: Decimal,
    /// Loans with a nonzero balance this month
    pub active_loans: usize,
}

/// Portfolio-wide view of a forecast run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub total_loan_amount: Decimal,
    pub total_outstanding: Decimal,
    pub total_undisbursed: Decimal,
    pub total_forecasted_amount: Decimal,

    /// Largest month-total balance across the horizon
    pub peak_exposure: Decimal,
    pub peak_month: Option<NaiveDate>,

    /// Per property type, the sum of each loan's peak projected balance
    pub exposure_by_property_type: BTreeMap<String, Decimal>,

    /// Month-by-month totals in calendar order
    pub monthly: BTreeMap<NaiveDate, MonthlyTotals>,
}

impl PortfolioSummary {
    pub fn from_results(results: &[LoanForecastResult]) -> Self {
        let mut summary = Self {
            loan_count: results.len(),
            ..Default::default()
        };

        for result in results {
            let loan = &result.loan;
            summary.total_loan_amount = summary.total_loan_amount.saturating_add(loan.loan_amount);
            summary.total_outstanding = summary.total_outstanding.saturating_add(loan.outstanding_balance);
            summary.total_undisbursed = summary.total_undisbursed.saturating_add(loan.undisbursed_amount);
            summary.total_forecasted_amount = summary
                .total_forecasted_amount
                .saturating_add(result.total_forecasted_amount);

            let property_type = match loan.property_type.trim() {
                "" => UNKNOWN_PROPERTY_TYPE,
                other => other,
            };
            let loan_peak = result.points.iter().map(|p| p.balance).max().unwrap_or(Decimal::ZERO);
            let exposure = summary
                .exposure_by_property_type
                .entry(property_type.to_string())
                .or_insert(Decimal::ZERO);
            *exposure = exposure.saturating_add(loan_peak);

            for point in &result.points {
                let totals = summary.monthly.entry(point.month).or_default();
                totals.balance = totals.balance.saturating_add(point.balance);
                totals.delta = totals.delta.saturating_add(point.delta);
                if !point.balance.is_zero() {
                    totals.active_loans += 1;
                }
            }
        }

        // Ties keep the earliest month
        for (month, totals) in &summary.monthly {
            if totals.balance > summary.peak_exposure {
                summary.peak_exposure = totals.balance;
                summary.peak_month = Some(*month);
            }
        }

        summary
    }

    /// `(MMM-yy, totals)` rows in calendar order
    pub fn monthly_rows(&self) -> impl Iterator<Item = (String, &MonthlyTotals)> + '_ {
        self.monthly.iter().map(|(month, totals)| (dates::month_label(*month), totals))
    }
}
