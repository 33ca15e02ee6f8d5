//! A ledger for a school cooperative's treasury.
//!
//! Income and expense transactions are recorded against two accounts, petty cash and a bank
//! account, and filed under categories. The `Ledger` keeps a snapshot of all data loaded from a
//! `Store` and derives account balances and monthly summaries from it.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod format;
pub mod ledger;
pub mod model;
mod store;
pub mod summary;
mod utils;
pub mod validate;

#[cfg(test)]
mod test;

pub use config::{Config, StoreKind, StoreSetup};
pub use error::{Error, ErrorType, Result};
pub use ledger::{Ledger, Snapshot};
pub use store::{Mode, Store};
