//! Types that represent the core data model, such as `Transaction`, `Category` and the treasury
//! accounts.
mod account;
mod category;
mod transaction;

pub use account::{AccountBalance, AccountId, InitialBalances};
pub use category::{Category, CategoryUpdates, NewCategory};
pub use transaction::{NewTransaction, Transaction, TransactionUpdates};

use serde::{Deserialize, Serialize};

/// Whether money came into, or went out of, a treasury account. Categories carry a type too, so
/// that a transaction can only be filed under a category of the same type.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    /// The sign applied to a transaction's amount when it is folded into a balance.
    pub fn sign(&self) -> f64 {
        match self {
            TransactionType::Income => 1.0,
            TransactionType::Expense => -1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_strings() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(TransactionType::Expense.to_string(), "expense");
        assert_eq!(
            TransactionType::from_str("income").unwrap(),
            TransactionType::Income
        );
        assert!(TransactionType::from_str("transfer").is_err());
    }
}
