//! The application state container.
//!
//! A `Ledger` owns a `Store` and the most recent `Snapshot` of the data. Every successful mutation
//! goes to the store first; only then is a new snapshot built from the previous one, published to
//! subscribers, and returned. A failed store call leaves the snapshot untouched.

mod filter;
mod snapshot;

pub use filter::{
    matching_transactions, paginate, transactions_in_period, Page, TransactionFilter, PAGE_SIZE,
};
pub use snapshot::Snapshot;

use crate::error::{Error, ErrorType, IntoResult, Result};
use crate::model::{
    AccountId, Category, CategoryUpdates, NewCategory, NewTransaction, Transaction,
    TransactionUpdates,
};
use crate::store::{self, Mode, Store};
use crate::Config;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct Ledger {
    store: Box<dyn Store>,
    sender: watch::Sender<Arc<Snapshot>>,
}

impl Ledger {
    /// Creates a ledger over `store` with an empty snapshot. Call `load` to fetch the data.
    pub fn new(store: Box<dyn Store>) -> Self {
        let (sender, _) = watch::channel(Arc::new(Snapshot::default()));
        Self { store, sender }
    }

    /// Opens the store selected by `config` and `mode` and loads the data from it.
    pub async fn open(config: &Config, mode: Mode) -> Result<Self> {
        let store = store::open(config, mode)
            .await
            .pub_result(ErrorType::Store)?;
        let mut ledger = Self::new(store);
        ledger.load().await?;
        Ok(ledger)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.sender.borrow().clone()
    }

    /// Returns a receiver that observes every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.sender.subscribe()
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.sender.send_replace(snapshot.clone());
        snapshot
    }

    /// Applies `f` to a copy of the current snapshot and publishes the result.
    fn patch(&self, f: impl FnOnce(&mut Snapshot)) -> Arc<Snapshot> {
        let mut next = Snapshot::clone(&self.snapshot());
        f(&mut next);
        self.publish(next)
    }

    /// Fetches categories, transactions and starting balances concurrently and replaces the
    /// snapshot with them. While the fetch runs the published snapshot has `loading` set. On
    /// failure the previous data is kept and `loading` is cleared.
    pub async fn load(&mut self) -> Result<Arc<Snapshot>> {
        self.patch(|s| s.loading = true);
        let fetched = tokio::try_join!(
            self.store.list_categories(),
            self.store.list_transactions(),
            self.store.list_balances(),
        );
        match fetched {
            Ok((categories, transactions, initial_balances)) => {
                debug!(
                    "Loaded {} categories and {} transactions",
                    categories.len(),
                    transactions.len()
                );
                Ok(self.publish(Snapshot::new(
                    categories,
                    transactions,
                    initial_balances,
                )))
            }
            Err(e) => {
                error!("Unable to load the ledger data: {e:#}");
                self.patch(|s| s.loading = false);
                Err(Error::new(ErrorType::Store, e))
            }
        }
    }

    /// Inserts a transaction and returns the new snapshot along with the stored record.
    pub async fn add_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<(Arc<Snapshot>, Transaction)> {
        let inserted = self
            .store
            .insert_transaction(&transaction)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Added transaction {}", inserted.id);
        let record = inserted.clone();
        let snapshot = self.patch(|s| s.transactions.push(inserted));
        Ok((snapshot, record))
    }

    /// Overwrites the fields of transaction `id` that are set in `updates`.
    pub async fn edit_transaction(
        &mut self,
        id: &str,
        updates: TransactionUpdates,
    ) -> Result<Arc<Snapshot>> {
        self.store
            .update_transaction(id, &updates)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Updated transaction {id}");
        Ok(self.patch(|s| {
            if let Some(t) = s.transactions.iter_mut().find(|t| t.id == id) {
                t.apply(&updates);
            }
        }))
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<Arc<Snapshot>> {
        self.store
            .delete_transaction(id)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Deleted transaction {id}");
        Ok(self.patch(|s| s.transactions.retain(|t| t.id != id)))
    }

    /// Inserts a category and returns the new snapshot along with the stored record.
    pub async fn add_category(
        &mut self,
        category: NewCategory,
    ) -> Result<(Arc<Snapshot>, Category)> {
        let inserted = self
            .store
            .insert_category(&category)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Added category {}", inserted.id);
        let record = inserted.clone();
        let snapshot = self.patch(|s| s.categories.push(inserted));
        Ok((snapshot, record))
    }

    pub async fn update_category(
        &mut self,
        id: &str,
        updates: CategoryUpdates,
    ) -> Result<Arc<Snapshot>> {
        self.store
            .update_category(id, &updates)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Updated category {id}");
        Ok(self.patch(|s| {
            if let Some(c) = s.categories.iter_mut().find(|c| c.id == id) {
                c.apply(&updates);
            }
        }))
    }

    /// Deletes category `id`. Refuses, without contacting the store, if any transaction in the
    /// current snapshot is filed under it.
    pub async fn delete_category(&mut self, id: &str) -> Result<Arc<Snapshot>> {
        let current = self.snapshot();
        if current.category_in_use(id) {
            return Err(Error::referential(format!(
                "The category '{}' is used by at least one transaction and cannot be deleted",
                current.category_name(id)
            )));
        }
        self.store
            .delete_category(id)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Deleted category {id}");
        Ok(self.patch(|s| s.categories.retain(|c| c.id != id)))
    }

    /// Sets the starting balance of `account`.
    pub async fn set_initial_balance(
        &mut self,
        account: AccountId,
        amount: f64,
    ) -> Result<Arc<Snapshot>> {
        self.store
            .set_balance(account, amount)
            .await
            .pub_result(ErrorType::Store)?;
        info!("Set the starting balance of {account} to {amount}");
        Ok(self.patch(|s| s.initial_balances.set(account, amount)))
    }
}
