//! Implements the `Store` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole CLI can
//! be run, top-to-bottom, without a hosted backend or a database file.

use crate::error::Res;
use crate::model::{
    AccountBalance, AccountId, Category, CategoryUpdates, InitialBalances, NewCategory,
    NewTransaction, Transaction, TransactionUpdates,
};
use crate::store::Store;
use crate::utils;
use anyhow::{anyhow, bail, Context};
use serde::de::DeserializeOwned;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing::trace;

/// The data held by one `MemoryStore`, plus an optional injected failure.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MemoryState {
    pub(crate) categories: Vec<Category>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) balances: Vec<AccountBalance>,
    /// When set, every call fails with this message.
    pub(crate) fail_with: Option<String>,
}

impl MemoryState {
    /// An empty state.
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            categories: Vec::new(),
            transactions: Vec::new(),
            balances: Vec::new(),
            fail_with: None,
        }
    }

    /// The seeded demo data.
    fn seeded() -> Res<Self> {
        Ok(Self {
            categories: load_csv(CATEGORY_DATA).context("Unable to load seed categories")?,
            transactions: load_csv(TRANSACTION_DATA).context("Unable to load seed transactions")?,
            balances: load_csv(BALANCE_DATA).context("Unable to load seed balances")?,
            fail_with: None,
        })
    }
}

/// All in-memory stores, keyed by the treasury home they belong to. Every `MemoryStore` opened
/// for the same home sees the same data, which is what lets a sequence of CLI commands (or tests)
/// build on each other.
fn states() -> &'static Mutex<HashMap<String, MemoryState>> {
    static STATES: OnceLock<Mutex<HashMap<String, MemoryState>>> = OnceLock::new();
    STATES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// An implementation of the `Store` trait that holds its data in memory. On first use the data
/// for a key is seeded with a handful of categories, transactions and starting balances.
#[derive(Debug, Clone)]
pub(crate) struct MemoryStore {
    key: String,
}

impl MemoryStore {
    pub(crate) fn new(key: impl AsRef<Path>) -> Self {
        Self {
            key: key.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Returns a copy of the current data.
    #[cfg(test)]
    pub(crate) fn get_state(&self) -> MemoryState {
        self.with_state(|state| Ok(state.clone())).unwrap()
    }

    /// Replaces the current data.
    #[cfg(test)]
    pub(crate) fn set_state(&self, state: MemoryState) {
        states().lock().unwrap().insert(self.key.clone(), state);
    }

    /// Makes every subsequent call fail with `message`, or clears the failure when `None`.
    #[cfg(test)]
    pub(crate) fn fail_with(&self, message: Option<&str>) {
        let mut map = states().lock().unwrap();
        if let Some(state) = map.get_mut(&self.key) {
            state.fail_with = message.map(str::to_string);
        } else {
            let mut state = MemoryState::seeded().unwrap();
            state.fail_with = message.map(str::to_string);
            map.insert(self.key.clone(), state);
        }
    }

    /// Runs `f` against this store's data, seeding it first if needed. Fails without calling `f`
    /// when a failure has been injected.
    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> Res<T>) -> Res<T> {
        let mut map = states()
            .lock()
            .map_err(|_| anyhow!("The in-memory store lock is poisoned"))?;
        if !map.contains_key(&self.key) {
            map.insert(self.key.clone(), MemoryState::seeded()?);
        }
        let state = map
            .get_mut(&self.key)
            .context("The in-memory store is missing its data")?;
        if let Some(message) = &state.fail_with {
            bail!("{message}");
        }
        f(state)
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn list_categories(&self) -> Res<Vec<Category>> {
        trace!("list_categories for {}", self.key);
        self.with_state(|state| {
            let mut categories = state.categories.clone();
            categories.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(categories)
        })
    }

    async fn insert_category(&self, category: &NewCategory) -> Res<Category> {
        self.with_state(|state| {
            let category = Category::new(utils::generate_id(), category.clone());
            state.categories.push(category.clone());
            Ok(category)
        })
    }

    async fn update_category(&self, id: &str, updates: &CategoryUpdates) -> Res<()> {
        self.with_state(|state| {
            let category = state
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .with_context(|| format!("Category not found: {id}"))?;
            category.apply(updates);
            Ok(())
        })
    }

    async fn delete_category(&self, id: &str) -> Res<()> {
        self.with_state(|state| {
            let before = state.categories.len();
            state.categories.retain(|c| c.id != id);
            if state.categories.len() == before {
                bail!("Category not found: {id}");
            }
            Ok(())
        })
    }

    async fn list_transactions(&self) -> Res<Vec<Transaction>> {
        trace!("list_transactions for {}", self.key);
        self.with_state(|state| {
            let mut transactions = state.transactions.clone();
            transactions.sort_by_key(|t| Reverse(t.date));
            Ok(transactions)
        })
    }

    async fn insert_transaction(&self, transaction: &NewTransaction) -> Res<Transaction> {
        self.with_state(|state| {
            let transaction = Transaction::new(utils::generate_id(), transaction.clone());
            state.transactions.push(transaction.clone());
            Ok(transaction)
        })
    }

    async fn update_transaction(&self, id: &str, updates: &TransactionUpdates) -> Res<()> {
        self.with_state(|state| {
            let transaction = state
                .transactions
                .iter_mut()
                .find(|t| t.id == id)
                .with_context(|| format!("Transaction not found: {id}"))?;
            transaction.apply(updates);
            Ok(())
        })
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        self.with_state(|state| {
            let before = state.transactions.len();
            state.transactions.retain(|t| t.id != id);
            if state.transactions.len() == before {
                bail!("Transaction not found: {id}");
            }
            Ok(())
        })
    }

    async fn list_balances(&self) -> Res<InitialBalances> {
        self.with_state(|state| Ok(InitialBalances::from_rows(&state.balances)))
    }

    async fn set_balance(&self, account: AccountId, amount: f64) -> Res<()> {
        self.with_state(|state| {
            match state.balances.iter_mut().find(|b| b.account == account) {
                Some(row) => row.initial_balance = amount,
                None => state
                    .balances
                    .push(AccountBalance::new(utils::generate_id(), account, amount)),
            }
            Ok(())
        })
    }
}

/// Deserializes every record of a CSV-formatted string that has a header row.
fn load_csv<T>(csv_data: &str) -> Res<Vec<T>>
where
    T: DeserializeOwned,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result.context("Unable to parse a CSV record")?);
    }
    Ok(records)
}

/// Seed category data.
const CATEGORY_DATA: &str = r##"id,name,type
1,Cuotas,income
2,Donaciones,income
3,Eventos,income
4,Materiales,expense
5,Servicios,expense
6,Salarios,expense
"##;

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"id,type,account,category_id,amount,date,description,vendor,check_number,receipt
1,income,cash,1,15000,2023-10-15,Cuotas de octubre,,,
2,expense,banco_provincia,6,50000,2023-10-16,Pago salarios,Personal docente,00012345,
3,income,banco_provincia,3,75000,2023-10-20,Evento de recaudación,,,
4,expense,cash,4,8500,2023-10-25,Compra de útiles,Librería El Ateneo,,
"##;

/// Seed starting balances.
const BALANCE_DATA: &str = r##"id,account,initial_balance
1,cash,50000
2,banco_provincia,100000
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::model::TransactionType;

    fn store() -> MemoryStore {
        MemoryStore::new(format!("memory-test-{}", utils::generate_id()))
    }

    #[tokio::test]
    async fn test_seed_data() {
        let store = store();
        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 6);
        // Ordered by name
        assert_eq!(categories[0].name(), "Cuotas");

        let transactions = store.list_transactions().await.unwrap();
        assert_eq!(transactions.len(), 4);
        // Newest first
        assert_eq!(transactions[0].id(), "4");
        let salaries = transactions.iter().find(|t| t.id() == "2").unwrap();
        assert_eq!(salaries.vendor(), Some("Personal docente"));
        assert_eq!(salaries.check_number(), Some("00012345"));
        assert_eq!(salaries.receipt(), None);

        let balances = store.list_balances().await.unwrap();
        assert_eq!(balances, InitialBalances::new(50000.0, 100000.0));
    }

    #[tokio::test]
    async fn test_stores_with_same_key_share_data() {
        let a = store();
        let b = MemoryStore::new(&a.key);
        let new = NewCategory::new("Rifas", TransactionType::Income);
        let inserted = a.insert_category(&new).await.unwrap();
        let found = b.list_categories().await.unwrap();
        assert!(found.iter().any(|c| c.id() == inserted.id()));
    }

    #[tokio::test]
    async fn test_transaction_crud() {
        let store = store();
        let new = NewTransaction::new(
            TransactionType::Income,
            AccountId::Cash,
            "2",
            1200.0,
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            "Donación",
        );
        let inserted = store.insert_transaction(&new).await.unwrap();
        assert_eq!(inserted.amount(), 1200.0);

        let updates = TransactionUpdates {
            amount: Some(1300.0),
            ..Default::default()
        };
        store.update_transaction(inserted.id(), &updates).await.unwrap();
        let found = store.list_transactions().await.unwrap();
        assert_eq!(found[0].id(), inserted.id());
        assert_eq!(found[0].amount(), 1300.0);

        store.delete_transaction(inserted.id()).await.unwrap();
        assert_eq!(store.list_transactions().await.unwrap().len(), 4);

        let err = store.delete_transaction(inserted.id()).await.unwrap_err();
        assert!(err.to_string().contains("Transaction not found"));
    }

    #[tokio::test]
    async fn test_set_balance_upserts() {
        let store = store();
        store.set_state(MemoryState::empty());
        assert_eq!(store.list_balances().await.unwrap(), InitialBalances::default());

        store.set_balance(AccountId::Cash, 700.0).await.unwrap();
        store.set_balance(AccountId::Cash, 800.0).await.unwrap();
        assert_eq!(store.get_state().balances.len(), 1);
        assert_eq!(
            store.list_balances().await.unwrap().get(AccountId::Cash),
            800.0
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = store();
        store.fail_with(Some("backend unavailable"));
        let err = store.list_categories().await.unwrap_err();
        assert_eq!(err.to_string(), "backend unavailable");
        store.fail_with(None);
        assert!(store.list_categories().await.is_ok());
    }
}
