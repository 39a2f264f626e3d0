//! Loan records, tape loading and normalization

mod data;
pub mod loader;
pub mod normalize;

pub use data::{LoanRecord, RawLoanRecord, MAX_AMOUNT};
pub use loader::{load_loans, load_loans_from_reader};
pub use normalize::{Normalizer, NormalizedBatch, RejectedLoan};
