//! Balance and monthly-summary figures derived from a list of transactions.
//!
//! Everything in here is a pure function of its arguments: nothing is cached and the transaction
//! list is never modified, so the functions can be called repeatedly, e.g. while switching between
//! periods.

use crate::model::{AccountId, InitialBalances, Transaction, TransactionType};
use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Returns the balance of `account`: `initial_balance` plus the income and minus the expenses
/// recorded on that account. Transactions on other accounts are ignored.
pub fn balance_for<'a, I>(transactions: I, account: AccountId, initial_balance: f64) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let signed_sum: f64 = transactions
        .into_iter()
        .filter(|t| t.account == account)
        .map(Transaction::signed_amount)
        .sum();
    initial_balance + signed_sum
}

/// Returns the sum of `balance_for` over every account in `initial_balances`.
pub fn total_balance<'a, I>(transactions: I, initial_balances: &InitialBalances) -> f64
where
    I: IntoIterator<Item = &'a Transaction> + Clone,
{
    initial_balances
        .iter()
        .map(|(account, initial)| balance_for(transactions.clone(), account, initial))
        .sum()
}

/// Computes the summary of one calendar month. `month` is 0-indexed (0 = January).
///
/// Months outside of `0..=11` roll over into the neighbouring years, so `monthly_summary(.., 12,
/// 2024)` is the summary of January 2025.
pub fn monthly_summary(
    transactions: &[Transaction],
    initial_balances: &InitialBalances,
    month: i32,
    year: i32,
) -> MonthlySummary {
    period_summary(transactions, initial_balances, Period::new(month, year))
}

/// Computes the summary of `period`.
///
/// - The opening balance is the total balance of everything dated before the first day of the
///   period.
/// - Income and expense are summed over the transactions dated from the first to the last day of
///   the period, both inclusive.
pub fn period_summary(
    transactions: &[Transaction],
    initial_balances: &InitialBalances,
    period: Period,
) -> MonthlySummary {
    let before = transactions.iter().filter(|t| t.date < period.first_day());
    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| period.contains(t.date))
        .collect();

    let mut account_initial_balances = BTreeMap::new();
    let mut account_final_balances = BTreeMap::new();
    for (account, initial) in initial_balances.iter() {
        let opening = balance_for(before.clone(), account, initial);
        let closing = balance_for(in_month.iter().copied(), account, opening);
        account_initial_balances.insert(account, opening);
        account_final_balances.insert(account, closing);
    }

    let initial_balance = total_balance(before, initial_balances);
    let total_income = sum_of_type(&in_month, TransactionType::Income);
    let total_expense = sum_of_type(&in_month, TransactionType::Expense);

    MonthlySummary {
        period,
        initial_balance,
        total_income,
        total_expense,
        final_balance: initial_balance + total_income - total_expense,
        account_initial_balances,
        account_final_balances,
    }
}

fn sum_of_type(transactions: &[&Transaction], r#type: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|t| t.r#type == r#type)
        .map(|t| t.amount)
        .sum()
}

/// Aggregated figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlySummary {
    pub period: Period,
    /// The total balance across all accounts immediately before the month starts.
    pub initial_balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    /// `initial_balance + total_income - total_expense`
    pub final_balance: f64,
    pub account_initial_balances: BTreeMap<AccountId, f64>,
    pub account_final_balances: BTreeMap<AccountId, f64>,
}

/// A calendar month. The month is held 0-indexed (0 = January).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a period from a 0-indexed month and a year, carrying months outside of `0..=11`
    /// into the neighbouring years.
    pub fn new(month: i32, year: i32) -> Self {
        let total = i64::from(year) * 12 + i64::from(month);
        let year = total.div_euclid(12);
        Self {
            year: i32::try_from(year).unwrap_or(if year < 0 { i32::MIN } else { i32::MAX }),
            month: total.rem_euclid(12) as u32,
        }
    }

    /// The period that `date` falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// The 0-indexed month.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The first day of the month. Saturates at the calendar limits for years that `chrono`
    /// cannot represent.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).unwrap_or(if self.year < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    /// The last day of the month, i.e. the day before the first day of the next month.
    pub fn last_day(&self) -> NaiveDate {
        let next = self.next().first_day();
        if next == NaiveDate::MAX {
            return NaiveDate::MAX;
        }
        next.pred_opt().unwrap_or(NaiveDate::MIN)
    }

    /// Whether `date` is between the first and the last day of the month, inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    pub fn next(&self) -> Self {
        Self::new(self.month as i32 + 1, self.year)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.month as i32 - 1, self.year)
    }

    /// The English name of the month, e.g. "March".
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month + 1)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or_default()
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn txn(
        id: &str,
        account: AccountId,
        r#type: TransactionType,
        amount: f64,
        on: &str,
    ) -> Transaction {
        Transaction::new(
            id,
            NewTransaction::new(r#type, account, "1", amount, date(on), "test"),
        )
    }

    fn example() -> (Vec<Transaction>, InitialBalances) {
        let transactions = vec![
            txn("a", AccountId::Cash, TransactionType::Income, 200.0, "2024-03-05"),
            txn(
                "b",
                AccountId::BancoProvincia,
                TransactionType::Expense,
                300.0,
                "2024-03-10",
            ),
        ];
        (transactions, InitialBalances::new(1000.0, 5000.0))
    }

    #[test]
    fn test_balance_for_example() {
        let (transactions, _) = example();
        assert_eq!(balance_for(&transactions, AccountId::Cash, 1000.0), 1200.0);
        assert_eq!(
            balance_for(&transactions, AccountId::BancoProvincia, 5000.0),
            4700.0
        );
    }

    #[test]
    fn test_balance_for_empty_list() {
        let none: Vec<Transaction> = Vec::new();
        assert_eq!(balance_for(&none, AccountId::Cash, 1000.0), 1000.0);
    }

    #[test]
    fn test_balance_for_matches_income_minus_expense() {
        let transactions = vec![
            txn("1", AccountId::Cash, TransactionType::Income, 15000.0, "2023-10-15"),
            txn("2", AccountId::Cash, TransactionType::Expense, 8500.0, "2023-10-25"),
            txn("3", AccountId::Cash, TransactionType::Income, 120.5, "2023-11-02"),
            txn(
                "4",
                AccountId::BancoProvincia,
                TransactionType::Income,
                75000.0,
                "2023-10-20",
            ),
        ];
        let income: f64 = transactions
            .iter()
            .filter(|t| t.account == AccountId::Cash && t.r#type == TransactionType::Income)
            .map(|t| t.amount)
            .sum();
        let expense: f64 = transactions
            .iter()
            .filter(|t| t.account == AccountId::Cash && t.r#type == TransactionType::Expense)
            .map(|t| t.amount)
            .sum();
        assert_eq!(
            balance_for(&transactions, AccountId::Cash, 50000.0),
            50000.0 + income - expense
        );
    }

    #[test]
    fn test_total_balance_example() {
        let (transactions, balances) = example();
        assert_eq!(total_balance(&transactions, &balances), 5900.0);
        let by_account: f64 = balances
            .iter()
            .map(|(a, b)| balance_for(&transactions, a, b))
            .sum();
        assert_eq!(total_balance(&transactions, &balances), by_account);
    }

    #[test]
    fn test_monthly_summary_march() {
        let (transactions, balances) = example();
        let summary = monthly_summary(&transactions, &balances, 2, 2024);
        assert_eq!(summary.initial_balance, 6000.0);
        assert_eq!(summary.total_income, 200.0);
        assert_eq!(summary.total_expense, 300.0);
        assert_eq!(summary.final_balance, 5900.0);
        assert_eq!(summary.account_initial_balances[&AccountId::Cash], 1000.0);
        assert_eq!(summary.account_final_balances[&AccountId::Cash], 1200.0);
        assert_eq!(
            summary.account_final_balances[&AccountId::BancoProvincia],
            4700.0
        );
    }

    #[test]
    fn test_monthly_summary_february_is_empty() {
        let (transactions, balances) = example();
        let summary = monthly_summary(&transactions, &balances, 1, 2024);
        assert_eq!(summary.initial_balance, 6000.0);
        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_expense, 0.0);
        assert_eq!(summary.final_balance, 6000.0);
    }

    #[test]
    fn test_monthly_summary_april_carries_march() {
        let (transactions, balances) = example();
        let summary = monthly_summary(&transactions, &balances, 3, 2024);
        assert_eq!(summary.initial_balance, 5900.0);
        assert_eq!(summary.final_balance, 5900.0);
        assert_eq!(
            summary.account_initial_balances[&AccountId::BancoProvincia],
            4700.0
        );
    }

    #[test]
    fn test_monthly_summary_is_idempotent() {
        let (transactions, balances) = example();
        let first = monthly_summary(&transactions, &balances, 2, 2024);
        let second = monthly_summary(&transactions, &balances, 2, 2024);
        assert_eq!(first, second);
    }

    #[test]
    fn test_month_boundaries_are_inclusive() {
        let balances = InitialBalances::default();
        let transactions = vec![
            txn("before", AccountId::Cash, TransactionType::Income, 1.0, "2024-01-31"),
            txn("first", AccountId::Cash, TransactionType::Income, 10.0, "2024-02-01"),
            txn("last", AccountId::Cash, TransactionType::Income, 100.0, "2024-02-29"),
            txn("after", AccountId::Cash, TransactionType::Income, 1000.0, "2024-03-01"),
        ];
        let summary = monthly_summary(&transactions, &balances, 1, 2024);
        assert_eq!(summary.initial_balance, 1.0);
        assert_eq!(summary.total_income, 110.0);
        assert_eq!(summary.final_balance, 111.0);
    }

    #[test]
    fn test_period_last_day_handles_month_lengths() {
        assert_eq!(Period::new(1, 2024).last_day(), date("2024-02-29"));
        assert_eq!(Period::new(1, 2023).last_day(), date("2023-02-28"));
        assert_eq!(Period::new(3, 2024).last_day(), date("2024-04-30"));
        assert_eq!(Period::new(11, 2024).last_day(), date("2024-12-31"));
    }

    #[test]
    fn test_period_rolls_over() {
        assert_eq!(Period::new(12, 2024), Period::new(0, 2025));
        assert_eq!(Period::new(-1, 2024), Period::new(11, 2023));
        assert_eq!(Period::new(11, 2024).next(), Period::new(0, 2025));
        assert_eq!(Period::new(0, 2024).previous(), Period::new(11, 2023));
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period::new(2, 2024).to_string(), "March 2024");
        assert_eq!(Period::from_date(date("2023-10-16")), Period::new(9, 2023));
    }
}
