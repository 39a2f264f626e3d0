//! Forecast report writers

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::dates;
use crate::error::LoaderError;
use crate::forecast::{ForecastRecord, LoanForecastResult};
use crate::portfolio::PortfolioSummary;

const LOAN_COLUMNS: [&str; 13] = [
    "Loan Number",
    "Customer Name",
    "Property Type",
    "Loan Amount",
    "Outstanding Balance",
    "Undisbursed Amount",
    "% of Loan Drawn",
    "% of Completion",
    "Maturity Date",
    "Extended Date",
    "Forecast Months",
    "Forecast Start Date",
    "Forecast End Date",
];

const TOTAL_COLUMN: &str = "Total Forecasted Amount";

/// Label in the first column of the trailing per-month sum row
pub const SUM_ROW_LABEL: &str = "SUM OF FORECAST";

/// `<stem>_forecast.csv` next to the input tape
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "loans".to_string());
    input.with_file_name(format!("{}_forecast.csv", stem))
}

/// Every month appearing in any result, in calendar order
pub fn forecast_months(results: &[LoanForecastResult]) -> Vec<NaiveDate> {
    let months: BTreeSet<NaiveDate> = results
        .iter()
        .flat_map(|r| r.points.iter().map(|p| p.month))
        .collect();
    months.into_iter().collect()
}

/// Write one row per loan: loan columns, one column per month, then the total.
///
/// Months a loan's schedule does not cover are written as `0`. A final
/// `SUM OF FORECAST` row carries the per-month sums, blank where the sum is zero.
pub fn write_forecast_csv<W: Write>(writer: W, results: &[LoanForecastResult]) -> Result<(), LoaderError> {
    let months = forecast_months(results);
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = LOAN_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(months.iter().map(|m| dates::month_label(*m)));
    header.push(TOTAL_COLUMN.to_string());
    wtr.write_record(&header)?;

    for result in results {
        let loan = &result.loan;
        let mut row = vec![
            loan.loan_number.clone(),
            loan.customer_name.clone(),
            loan.property_type.clone(),
            loan.loan_amount.to_string(),
            loan.outstanding_balance.to_string(),
            loan.undisbursed_amount.to_string(),
            (loan.percent_of_loan_drawn * Decimal::ONE_HUNDRED).normalize().to_string(),
            (loan.completion * Decimal::ONE_HUNDRED).normalize().to_string(),
            loan.maturity_date.to_string(),
            loan.extended_date.to_string(),
            result.forecast_months().to_string(),
            result.points.first().map(|p| p.label()).unwrap_or_default(),
            result.points.last().map(|p| p.label()).unwrap_or_default(),
        ];
        row.extend(months.iter().map(|m| {
            result
                .balance_at(*m)
                .map(|b| b.to_string())
                .unwrap_or_else(|| "0".to_string())
        }));
        row.push(result.total_forecasted_amount.to_string());
        wtr.write_record(&row)?;
    }

    let summary = PortfolioSummary::from_results(results);
    let mut sum_row = vec![SUM_ROW_LABEL.to_string()];
    sum_row.extend(std::iter::repeat(String::new()).take(LOAN_COLUMNS.len() - 1));
    sum_row.extend(months.iter().map(|m| {
        summary
            .monthly
            .get(m)
            .map(|totals| totals.balance)
            .filter(|sum| *sum > Decimal::ZERO)
            .map(|sum| sum.to_string())
            .unwrap_or_default()
    }));
    sum_row.push(if summary.total_forecasted_amount > Decimal::ZERO {
        summary.total_forecasted_amount.to_string()
    } else {
        String::new()
    });
    wtr.write_record(&sum_row)?;

    wtr.flush()?;
    Ok(())
}

/// Write the CSV report to `path`
pub fn write_forecast_csv_file(path: &Path, results: &[LoanForecastResult]) -> Result<(), LoaderError> {
    let file = File::create(path)?;
    write_forecast_csv(file, results)?;
    log::info!("Forecast results written to {}", path.display());
    Ok(())
}

/// Pretty JSON array of [`ForecastRecord`]s
pub fn forecast_json(results: &[LoanForecastResult]) -> serde_json::Result<String> {
    let records: Vec<ForecastRecord> = results.iter().map(ForecastRecord::from).collect();
    serde_json::to_string_pretty(&records)
}
