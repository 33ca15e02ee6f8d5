//! The data access layer. A `Store` persists the three kinds of record the ledger works with:
//! categories, transactions and the starting balance of each account.
//!
//! There are three implementations:
//! - `RestStore` talks to a hosted, PostgREST-style backend
//! - `SqliteStore` keeps everything in a local SQLite file
//! - `MemoryStore` holds seeded demo data in memory and is used for tests and demos
//!
//! Row decoding for every store happens here, so a row with a malformed date or an unknown
//! account is rejected before it reaches the ledger.

mod memory;
mod migrations;
mod rest;
mod sqlite;

use crate::config::StoreKind;
use crate::error::Res;
use crate::model::{
    AccountId, Category, CategoryUpdates, InitialBalances, NewCategory, NewTransaction,
    Transaction, TransactionUpdates,
};
use crate::Config;
use anyhow::Context;
use tracing::debug;

pub(crate) use memory::MemoryStore;
#[cfg(test)]
pub(crate) use memory::MemoryState;
pub(crate) use rest::RestStore;
pub(crate) use sqlite::SqliteStore;

pub(crate) const CATEGORIES: &str = "categories";
pub(crate) const TRANSACTIONS: &str = "transactions";
pub(crate) const ACCOUNT_BALANCES: &str = "account_balances";

/// The operations the ledger needs from a backing store. Every method takes `&self` so that the
/// three lists can be fetched concurrently.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Lists every category, ordered by name.
    async fn list_categories(&self) -> Res<Vec<Category>>;

    /// Inserts a category and returns it with the ID assigned by the store.
    async fn insert_category(&self, category: &NewCategory) -> Res<Category>;

    /// Overwrites the fields of category `id` that are set in `updates`.
    async fn update_category(&self, id: &str, updates: &CategoryUpdates) -> Res<()>;

    async fn delete_category(&self, id: &str) -> Res<()>;

    /// Lists every transaction, newest first.
    async fn list_transactions(&self) -> Res<Vec<Transaction>>;

    /// Inserts a transaction and returns it with the ID assigned by the store.
    async fn insert_transaction(&self, transaction: &NewTransaction) -> Res<Transaction>;

    /// Overwrites the fields of transaction `id` that are set in `updates`.
    async fn update_transaction(&self, id: &str, updates: &TransactionUpdates) -> Res<()>;

    async fn delete_transaction(&self, id: &str) -> Res<()>;

    /// Reads the starting balance of every account. Accounts without a stored balance are `0.0`.
    async fn list_balances(&self) -> Res<InitialBalances>;

    /// Sets the starting balance of `account`, creating the row if it does not exist.
    async fn set_balance(&self, account: AccountId, amount: f64) -> Res<()>;
}

/// Selects the in-memory store for testing.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Use the store named in the configuration file.
    #[default]
    Configured,
    /// Use an in-memory store seeded with demo data.
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `TREASURY_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var("TREASURY_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Configured,
        }
    }
}

/// Opens the store for `config`.
pub(crate) async fn open(config: &Config, mode: Mode) -> Res<Box<dyn Store>> {
    if mode == Mode::Test {
        debug!("Using the in-memory store");
        return Ok(Box::new(MemoryStore::new(config.root())));
    }
    match config.store() {
        StoreKind::Rest => {
            let api_key = crate::utils::read(&config.api_key_path())
                .await
                .context("Unable to read the store API key")?;
            let store = RestStore::new(config.store_url(), api_key.trim())?;
            debug!("Using the REST store at {}", config.store_url());
            Ok(Box::new(store))
        }
        StoreKind::Sqlite => {
            let store = SqliteStore::open(&config.sqlite_path()).await?;
            debug!("Using the SQLite store at {}", config.sqlite_path().display());
            Ok(Box::new(store))
        }
    }
}
