use crate::ledger::filter::{self, TransactionFilter};
use crate::model::{AccountId, Category, InitialBalances, Transaction};
use crate::summary::{self, MonthlySummary, Period};
use serde::Serialize;

/// An immutable view of the ledger data at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub(super) categories: Vec<Category>,
    pub(super) transactions: Vec<Transaction>,
    pub(super) initial_balances: InitialBalances,
    /// Whether a load is in progress.
    pub(super) loading: bool,
}

impl Snapshot {
    pub fn new(
        categories: Vec<Category>,
        transactions: Vec<Transaction>,
        initial_balances: InitialBalances,
    ) -> Self {
        Self {
            categories,
            transactions,
            initial_balances,
            loading: false,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn initial_balances(&self) -> &InitialBalances {
        &self.initial_balances
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// The current balance of `account`.
    pub fn balance(&self, account: AccountId) -> f64 {
        summary::balance_for(
            &self.transactions,
            account,
            self.initial_balances.get(account),
        )
    }

    /// The current balance across all accounts.
    pub fn total_balance(&self) -> f64 {
        summary::total_balance(&self.transactions, &self.initial_balances)
    }

    /// The summary of a month. `month` is 0-indexed.
    pub fn monthly_summary(&self, month: i32, year: i32) -> MonthlySummary {
        summary::monthly_summary(&self.transactions, &self.initial_balances, month, year)
    }

    pub fn period_summary(&self, period: Period) -> MonthlySummary {
        summary::period_summary(&self.transactions, &self.initial_balances, period)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The name of category `id`, or "Unknown".
    pub fn category_name(&self, id: &str) -> &str {
        filter::category_name(&self.categories, id)
    }

    /// Whether any transaction is filed under category `id`.
    pub fn category_in_use(&self, id: &str) -> bool {
        self.transactions.iter().any(|t| t.category_id == id)
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// The transactions of `period` that pass `filter`, newest first.
    pub fn filtered_transactions(
        &self,
        period: Period,
        filter: &TransactionFilter,
    ) -> Vec<&Transaction> {
        filter::transactions_in_period(&self.transactions, &self.categories, period, filter)
    }

    /// Every transaction that passes `filter`, newest first.
    pub fn matching_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        filter::matching_transactions(&self.transactions, &self.categories, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewCategory, NewTransaction, TransactionType};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tx(id: &str, t: TransactionType, account: AccountId, amount: f64, d: &str) -> Transaction {
        Transaction::new(id, NewTransaction::new(t, account, "1", amount, date(d), id))
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Category::new("1", NewCategory::new("Cuotas", TransactionType::Income)),
                Category::new("4", NewCategory::new("Materiales", TransactionType::Expense)),
            ],
            vec![
                tx("1", TransactionType::Income, AccountId::Cash, 500.0, "2024-03-01"),
                tx("2", TransactionType::Expense, AccountId::Cash, 300.0, "2024-03-15"),
                tx("3", TransactionType::Income, AccountId::BancoProvincia, 200.0, "2024-02-20"),
            ],
            InitialBalances::new(1000.0, 5000.0),
        )
    }

    #[test]
    fn test_balances() {
        let snapshot = snapshot();
        assert_eq!(snapshot.balance(AccountId::Cash), 1200.0);
        assert_eq!(snapshot.balance(AccountId::BancoProvincia), 5200.0);
        assert_eq!(snapshot.total_balance(), 6400.0);
    }

    #[test]
    fn test_monthly_summary() {
        let summary = snapshot().monthly_summary(2, 2024);
        assert_eq!(summary.initial_balance, 6200.0);
        assert_eq!(summary.total_income, 500.0);
        assert_eq!(summary.total_expense, 300.0);
        assert_eq!(summary.final_balance, 6400.0);
    }

    #[test]
    fn test_category_queries() {
        let snapshot = snapshot();
        assert_eq!(snapshot.category_name("4"), "Materiales");
        assert_eq!(snapshot.category_name("nope"), "Unknown");
        assert!(snapshot.category_in_use("1"));
        assert!(!snapshot.category_in_use("4"));
        assert!(snapshot.category("4").is_some());
        assert!(snapshot.transaction("3").is_some());
        assert!(snapshot.transaction("9").is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.total_balance(), 0.0);
        assert!(!snapshot.loading());
        assert_eq!(snapshot.initial_balances().iter().count(), 2);
    }
}
