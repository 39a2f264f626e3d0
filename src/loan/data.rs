//! Loan record structures matching the loan tape format

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::LoanRejection;

/// Largest amount a loan field may carry (one quadrillion).
///
/// Balances summed over a schedule stay far inside `Decimal`'s range below this.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// A loan row as it comes off the tape, every field still a string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLoanRecord {
    pub loan_number: String,
    pub customer_name: String,
    pub property_type: String,
    pub address: String,
    pub loan_amount: String,
    pub maturity_date: String,
    pub extended_date: String,
    pub outstanding_balance: String,
    pub undisbursed_amount: String,
    pub percent_of_loan_drawn: String,
    pub percent_of_completion: String,
}

/// A single normalized construction loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Loan number (unique within a batch)
    pub loan_number: String,

    /// Borrower name (pass-through)
    #[serde(default)]
    pub customer_name: String,

    /// Property type (pass-through)
    #[serde(default)]
    pub property_type: String,

    /// Job address (pass-through)
    #[serde(default)]
    pub address: String,

    /// Committed loan amount
    pub loan_amount: Decimal,

    /// Amount disbursed and owed as of the forecast reference date
    pub outstanding_balance: Decimal,

    /// Commitment not yet paid out
    pub undisbursed_amount: Decimal,

    /// Construction completion as a fraction in [0, 1]
    pub completion: Decimal,

    /// Share of the loan drawn so far, as a fraction (pass-through)
    #[serde(default)]
    pub percent_of_loan_drawn: Decimal,

    pub maturity_date: NaiveDate,

    /// Contractual (revised) completion date, the model's time horizon
    pub extended_date: NaiveDate,
}

impl LoanRecord {
    /// Create a loan with the fields the forecast math needs
    pub fn new(
        loan_number: impl Into<String>,
        loan_amount: Decimal,
        outstanding_balance: Decimal,
        undisbursed_amount: Decimal,
        completion: Decimal,
        maturity_date: NaiveDate,
        extended_date: NaiveDate,
    ) -> Self {
        Self {
            loan_number: loan_number.into(),
            customer_name: String::new(),
            property_type: String::new(),
            address: String::new(),
            loan_amount,
            outstanding_balance,
            undisbursed_amount,
            completion,
            percent_of_loan_drawn: Decimal::ZERO,
            maturity_date,
            extended_date,
        }
    }

    /// Builder-style customer name
    pub fn with_customer(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = customer_name.into();
        self
    }

    /// Check the non-negativity and range invariants
    pub fn validate(&self) -> Result<(), LoanRejection> {
        for amount in [self.loan_amount, self.outstanding_balance, self.undisbursed_amount] {
            if amount > MAX_AMOUNT {
                return Err(LoanRejection::AmountOutOfRange(amount));
            }
        }
        if self.outstanding_balance < Decimal::ZERO {
            return Err(LoanRejection::NegativeOutstanding(self.outstanding_balance));
        }
        if self.undisbursed_amount < Decimal::ZERO {
            return Err(LoanRejection::NegativeUndisbursed(self.undisbursed_amount));
        }
        if self.completion < Decimal::ZERO || self.completion > Decimal::ONE {
            return Err(LoanRejection::CompletionOutOfRange(self.completion));
        }
        Ok(())
    }

    /// Upper bound on what the loan can ever have disbursed
    pub fn disbursement_ceiling(&self) -> Decimal {
        self.outstanding_balance.saturating_add(self.undisbursed_amount)
    }

    /// Completion as f64 for the curve math
    pub fn completion_f64(&self) -> f64 {
        self.completion.to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_loan() -> LoanRecord {
        LoanRecord::new(
            "L-100",
            dec!(1000000),
            dec!(400000),
            dec!(600000),
            dec!(0.45),
            date(2026, 6, 30),
            date(2026, 9, 30),
        )
    }

    #[test]
    fn test_valid_loan_passes() {
        assert_eq!(test_loan().validate(), Ok(()));
        assert_eq!(test_loan().disbursement_ceiling(), dec!(1000000));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut loan = test_loan();
        loan.outstanding_balance = dec!(-500);
        assert_eq!(
            loan.validate(),
            Err(LoanRejection::NegativeOutstanding(dec!(-500)))
        );

        let mut loan = test_loan();
        loan.undisbursed_amount = dec!(-0.01);
        assert!(matches!(loan.validate(), Err(LoanRejection::NegativeUndisbursed(_))));
    }

    #[test]
    fn test_amount_bound() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000000));

        let mut loan = test_loan();
        loan.outstanding_balance = MAX_AMOUNT;
        assert!(loan.validate().is_ok());

        loan.undisbursed_amount = dec!(10000000000000000000000000000);
        assert_eq!(
            loan.validate(),
            Err(LoanRejection::AmountOutOfRange(dec!(10000000000000000000000000000)))
        );
    }

    #[test]
    fn test_completion_bounds() {
        let mut loan = test_loan();
        loan.completion = dec!(1);
        assert!(loan.validate().is_ok());
        loan.completion = dec!(0);
        assert!(loan.validate().is_ok());
        loan.completion = dec!(1.01);
        assert!(matches!(loan.validate(), Err(LoanRejection::CompletionOutOfRange(_))));
        loan.completion = dec!(-0.1);
        assert!(matches!(loan.validate(), Err(LoanRejection::CompletionOutOfRange(_))));
    }
}
