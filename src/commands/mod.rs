//! Command handlers for the treasury CLI.
//!
//! Each handler opens the ledger, performs one operation and returns an `Out` holding a message for
//! the user and the structured result.

mod delete;
mod init;
mod insert;
mod report;
mod set_balance;
mod update;

use crate::args::PeriodArgs;
use crate::summary::Period;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use delete::{delete_category, delete_transactions};
pub use init::init;
pub use insert::{insert_category, insert_transaction};
pub use report::{balance, categories, summary, transactions, Balances};
pub use set_balance::set_balance;
pub use update::{update_category, update_transaction};

/// The output type for a command: a message to print for the user and, optionally, structured
/// data describing the outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The local calendar date.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Resolves the month selected on the command line, falling back to the month and year of
/// `today` for the parts that were left out.
pub(crate) fn resolve_period(args: &PeriodArgs, today: NaiveDate) -> Period {
    let month = args.month().unwrap_or(today.month());
    let year = args.year().unwrap_or(today.year());
    Period::new(month as i32 - 1, year)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_period_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let period = resolve_period(&PeriodArgs::default(), today);
        assert_eq!(period, Period::new(2, 2024));

        let period = resolve_period(&PeriodArgs::new(Some(12), None), today);
        assert_eq!(period.month(), 11);
        assert_eq!(period.year(), 2024);

        let period = resolve_period(&PeriodArgs::new(None, Some(2023)), today);
        assert_eq!(period.to_string(), "March 2023");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "transaction", "transactions"), "1 transaction");
        assert_eq!(plural(0, "category", "categories"), "0 categories");
    }
}
