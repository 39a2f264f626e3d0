//! Normalize raw loan tape rows into validated loan records
//!
//! Parsing is deliberately lenient: an amount that cannot be read becomes zero
//! and a date that cannot be read becomes "today". Only missing required
//! fields and the range invariants on [`LoanRecord`] reject a row.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use super::{LoanRecord, RawLoanRecord};
use crate::error::LoanRejection;

/// A row that did not make it into the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedLoan {
    pub loan_number: String,
    pub reason: String,
}

/// Accepted records plus the rows that were turned away
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<LoanRecord>,
    pub rejected: Vec<RejectedLoan>,
}

impl NormalizedBatch {
    pub fn total_records(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Turns [`RawLoanRecord`]s into [`LoanRecord`]s
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Fallback for unreadable dates
    today: NaiveDate,
}

impl Normalizer {
    /// Normalizer whose date fallback is the local calendar date
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Normalizer with a pinned "today", for reproducible runs
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Normalize one row
    pub fn normalize(&self, raw: &RawLoanRecord) -> Result<LoanRecord, LoanRejection> {
        let required = [
            ("Loan Number", &raw.loan_number),
            ("Loan Amount", &raw.loan_amount),
            ("Maturity Date", &raw.maturity_date),
            ("Extended Date", &raw.extended_date),
            ("Outstanding Balance", &raw.outstanding_balance),
            ("Undisbursed Amount", &raw.undisbursed_amount),
            ("% of Completion", &raw.percent_of_completion),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| is_blank(value)) {
            return Err(LoanRejection::MissingField(*field));
        }

        let record = LoanRecord {
            loan_number: raw.loan_number.trim().to_string(),
            customer_name: raw.customer_name.trim().to_string(),
            property_type: raw.property_type.trim().to_string(),
            address: raw.address.trim().to_string(),
            loan_amount: parse_amount(&raw.loan_amount),
            outstanding_balance: parse_amount(&raw.outstanding_balance),
            undisbursed_amount: parse_amount(&raw.undisbursed_amount),
            completion: parse_percent(&raw.percent_of_completion),
            percent_of_loan_drawn: parse_percent(&raw.percent_of_loan_drawn),
            maturity_date: parse_date(&raw.maturity_date, self.today),
            extended_date: parse_date(&raw.extended_date, self.today),
        };

        record.validate()?;
        Ok(record)
    }

    /// Normalize a whole tape, keeping input order
    pub fn normalize_batch(&self, rows: &[RawLoanRecord]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for raw in rows {
            match self.normalize(raw) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    log::warn!("Rejected loan '{}': {}", raw.loan_number.trim(), reason);
                    batch.rejected.push(RejectedLoan {
                        loan_number: raw.loan_number.trim().to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Normalized {} of {} loan rows",
            batch.records.len(),
            batch.total_records()
        );
        batch
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty, whitespace-only or the tape's "N/A" placeholder
pub fn is_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("N/A")
}

/// Parse a money-like amount, ignoring `$`, `%`, commas and whitespace.
///
/// Anything unreadable is zero.
pub fn parse_amount(value: &str) -> Decimal {
    if is_blank(value) {
        return Decimal::ZERO;
    }
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();

    match Decimal::from_str(&cleaned) {
        Ok(amount) => amount,
        Err(_) => {
            log::warn!("Could not parse amount from '{}', using 0", value);
            Decimal::ZERO
        }
    }
}

/// Parse a percentage (`"45%"`, `"45"`, `"45.5"`) into a fraction
pub fn parse_percent(value: &str) -> Decimal {
    parse_amount(value) / Decimal::ONE_HUNDRED
}

/// Parse a calendar date in `M/D/YY`, `M/D/YYYY`, `YYYY/MM/DD` or ISO form.
///
/// Two-digit years below 50 land in the 2000s, the rest in the 1900s.
/// Unreadable input falls back to `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> NaiveDate {
    let value = value.trim();
    if is_blank(value) {
        return today;
    }

    let parsed = if value.contains('/') {
        parse_slash_date(value)
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    };

    parsed.unwrap_or_else(|| {
        log::warn!("Could not parse date '{}', using {}", value, today);
        today
    })
}

fn parse_slash_date(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    // YYYY/MM/DD
    if parts[0].len() == 4 {
        let year: i32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let day: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let mut year: i32 = parts[2].parse().ok()?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw_loan() -> RawLoanRecord {
        RawLoanRecord {
            loan_number: "CL-2041".into(),
            customer_name: "Harbor View LLC".into(),
            property_type: "Multifamily".into(),
            address: "12 Pier Rd".into(),
            loan_amount: "$2,500,000.00".into(),
            maturity_date: "6/30/26".into(),
            extended_date: "12/31/2026".into(),
            outstanding_balance: "$1,125,000.00".into(),
            undisbursed_amount: "$1,375,000.00".into(),
            percent_of_loan_drawn: "45%".into(),
            percent_of_completion: "40%".into(),
        }
    }

    #[test]
    fn test_parse_amount_strips_formatting() {
        assert_eq!(parse_amount("$1,234,567.89"), dec!(1234567.89));
        assert_eq!(parse_amount(" 12 500 "), dec!(12500));
        assert_eq!(parse_amount("-500"), dec!(-500));
        assert_eq!(parse_amount("75%"), dec!(75));
    }

    #[test]
    fn test_parse_amount_lenient_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("N/A"), Decimal::ZERO);
        assert_eq!(parse_amount("TBD"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("45%"), dec!(0.45));
        assert_eq!(parse_percent("100"), dec!(1));
        assert_eq!(parse_percent("12.5 %"), dec!(0.125));
    }

    #[test]
    fn test_parse_date_formats() {
        let today = date(2025, 3, 15);
        assert_eq!(parse_date("6/30/26", today), date(2026, 6, 30));
        assert_eq!(parse_date("6/30/75", today), date(1975, 6, 30));
        assert_eq!(parse_date("06/30/2026", today), date(2026, 6, 30));
        assert_eq!(parse_date("2026-06-30", today), date(2026, 6, 30));
        assert_eq!(parse_date("2026/06/30", today), date(2026, 6, 30));
    }

    #[test]
    fn test_parse_date_falls_back_to_today() {
        let today = date(2025, 3, 15);
        assert_eq!(parse_date("", today), today);
        assert_eq!(parse_date("n/a", today), today);
        assert_eq!(parse_date("next spring", today), today);
        assert_eq!(parse_date("2/30/2026", today), today);
    }

    #[test]
    fn test_normalize_valid_row() {
        let normalizer = Normalizer::with_today(date(2025, 3, 15));
        let loan = normalizer.normalize(&raw_loan()).unwrap();

        assert_eq!(loan.loan_number, "CL-2041");
        assert_eq!(loan.loan_amount, dec!(2500000.00));
        assert_eq!(loan.outstanding_balance, dec!(1125000.00));
        assert_eq!(loan.completion, dec!(0.40));
        assert_eq!(loan.percent_of_loan_drawn, dec!(0.45));
        assert_eq!(loan.maturity_date, date(2026, 6, 30));
        assert_eq!(loan.extended_date, date(2026, 12, 31));
    }

    #[test]
    fn test_normalize_rejects_missing_fields() {
        let normalizer = Normalizer::with_today(date(2025, 3, 15));

        let mut raw = raw_loan();
        raw.loan_number = "N/A".into();
        assert_eq!(
            normalizer.normalize(&raw),
            Err(LoanRejection::MissingField("Loan Number"))
        );

        let mut raw = raw_loan();
        raw.extended_date = "  ".into();
        assert_eq!(
            normalizer.normalize(&raw),
            Err(LoanRejection::MissingField("Extended Date"))
        );
    }

    #[test]
    fn test_normalize_rejects_out_of_range() {
        let normalizer = Normalizer::with_today(date(2025, 3, 15));

        let mut raw = raw_loan();
        raw.outstanding_balance = "-500".into();
        assert!(matches!(
            normalizer.normalize(&raw),
            Err(LoanRejection::NegativeOutstanding(_))
        ));

        let mut raw = raw_loan();
        raw.percent_of_completion = "120%".into();
        assert!(matches!(
            normalizer.normalize(&raw),
            Err(LoanRejection::CompletionOutOfRange(_))
        ));
    }

    #[test]
    fn test_unreadable_amount_becomes_zero_not_rejection() {
        let normalizer = Normalizer::with_today(date(2025, 3, 15));
        let mut raw = raw_loan();
        raw.undisbursed_amount = "pending".into();

        let loan = normalizer.normalize(&raw).unwrap();
        assert_eq!(loan.undisbursed_amount, Decimal::ZERO);
    }

    #[test]
    fn test_normalize_batch_counts() {
        let normalizer = Normalizer::with_today(date(2025, 3, 15));
        let mut bad = raw_loan();
        bad.loan_number = "CL-9".into();
        bad.outstanding_balance = "-500".into();

        let batch = normalizer.normalize_batch(&[raw_loan(), bad]);
        assert_eq!(batch.total_records(), 2);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].loan_number, "CL-9");
    }
}
