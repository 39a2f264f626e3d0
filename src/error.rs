//! Error types for record rejection and loan tape I/O

use rust_decimal::Decimal;
use thiserror::Error;

/// Reason a loan record was excluded from a forecast run.
///
/// Rejections are never fatal. They are counted as failed records and the
/// rest of the batch carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanRejection {
    #[error("required field '{0}' is empty or N/A")]
    MissingField(&'static str),

    #[error("outstanding balance is negative: {0}")]
    NegativeOutstanding(Decimal),

    #[error("undisbursed amount is negative: {0}")]
    NegativeUndisbursed(Decimal),

    #[error("completion {0} is outside [0, 1]")]
    CompletionOutOfRange(Decimal),

    #[error("amount {0} exceeds the supported maximum")]
    AmountOutOfRange(Decimal),
}

/// Failure reading or writing a loan tape.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("loan tape has no '{0}' column")]
    MissingColumn(&'static str),
}
