//! Load raw loan rows from a loan tape CSV

use super::RawLoanRecord;
use crate::error::LoaderError;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::path::Path;

const LOAN_NUMBER: &str = "Loan Number";
const CUSTOMER_NAME: &str = "Customer Name";
const PROPERTY_TYPE: &str = "Property Type";
const JOB_ADDRESS: &str = "Job Address";
const LOAN_AMOUNT: &str = "Loan Amount";
const MATURITY_DATE: &str = "Maturity Date";
const EXTENDED_DATE: &str = "Extended Date";
const OUTSTANDING_BALANCE: &str = "Outstanding Balance";
const UNDISBURSED_AMOUNT: &str = "Undisbursed Amount";
const PERCENT_DRAWN: &str = "% of Loan Drawn";
const PERCENT_COMPLETION: &str = "% of Completion";

/// Column positions resolved from the header row
struct ColumnMap {
    indexes: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoaderError> {
        let cleaned: Vec<String> = headers.iter().map(clean_header).collect();
        let mut indexes = HashMap::new();

        for column in [
            LOAN_NUMBER,
            CUSTOMER_NAME,
            PROPERTY_TYPE,
            JOB_ADDRESS,
            LOAN_AMOUNT,
            MATURITY_DATE,
            EXTENDED_DATE,
            OUTSTANDING_BALANCE,
            UNDISBURSED_AMOUNT,
            PERCENT_DRAWN,
            PERCENT_COMPLETION,
        ] {
            if let Some(idx) = cleaned.iter().position(|h| h == column) {
                indexes.insert(column, idx);
            }
        }

        if !indexes.contains_key(LOAN_NUMBER) {
            return Err(LoaderError::MissingColumn(LOAN_NUMBER));
        }
        log::debug!("Loan tape column mapping: {:?}", indexes);

        Ok(Self { indexes })
    }

    /// Missing columns and short rows read as empty
    fn get(&self, row: &StringRecord, column: &str) -> String {
        self.indexes
            .get(column)
            .and_then(|&idx| row.get(idx))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn to_raw(&self, row: &StringRecord) -> RawLoanRecord {
        RawLoanRecord {
            loan_number: self.get(row, LOAN_NUMBER),
            customer_name: self.get(row, CUSTOMER_NAME),
            property_type: self.get(row, PROPERTY_TYPE),
            address: self.get(row, JOB_ADDRESS),
            loan_amount: self.get(row, LOAN_AMOUNT),
            maturity_date: self.get(row, MATURITY_DATE),
            extended_date: self.get(row, EXTENDED_DATE),
            outstanding_balance: self.get(row, OUTSTANDING_BALANCE),
            undisbursed_amount: self.get(row, UNDISBURSED_AMOUNT),
            percent_of_loan_drawn: self.get(row, PERCENT_DRAWN),
            percent_of_completion: self.get(row, PERCENT_COMPLETION),
        }
    }
}

/// Strip BOM and quotes, trim, collapse inner whitespace
fn clean_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .replace('"', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Load all loan rows from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<RawLoanRecord>, LoaderError> {
    let file = std::fs::File::open(path)?;
    load_loans_from_reader(file)
}

/// Load loan rows from any reader (e.g., string buffer, network stream)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<RawLoanRecord>, LoaderError> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::from_headers(csv_reader.headers()?)?;
    let mut loans = Vec::new();

    for result in csv_reader.records() {
        let row = result?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        loans.push(columns.to_raw(&row));
    }

    log::info!("Loaded {} loan rows from tape", loans.len());
    Ok(loans)
}
