use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the two treasury cash pools.
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
pub enum AccountId {
    /// Petty cash held by the treasurer.
    #[default]
    #[value(name = "cash")]
    Cash,
    /// The cooperative's account at Banco Provincia.
    #[value(name = "banco_provincia")]
    BancoProvincia,
}

serde_plain::derive_display_from_serialize!(AccountId);
serde_plain::derive_fromstr_from_deserialize!(AccountId);

impl AccountId {
    /// Every account, in display order.
    pub const ALL: [AccountId; 2] = [AccountId::Cash, AccountId::BancoProvincia];

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            AccountId::Cash => "Caja Chica",
            AccountId::BancoProvincia => "Banco Provincia",
        }
    }
}

/// The starting balance of each account before any recorded transaction.
///
/// There is always an entry for every `AccountId`: accounts that were never given a starting
/// balance hold `0.0`. This is what lets the balance functions look up any account without a
/// missing-key case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<AccountId, f64>",
    into = "BTreeMap<AccountId, f64>"
)]
pub struct InitialBalances {
    balances: BTreeMap<AccountId, f64>,
}

impl Default for InitialBalances {
    fn default() -> Self {
        Self {
            balances: AccountId::ALL.iter().map(|&a| (a, 0.0)).collect(),
        }
    }
}

impl InitialBalances {
    pub fn new(cash: f64, banco_provincia: f64) -> Self {
        Self::default()
            .with(AccountId::Cash, cash)
            .with(AccountId::BancoProvincia, banco_provincia)
    }

    /// Folds stored balance rows into a fully-populated map. When an account appears more than
    /// once the last row wins.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a AccountBalance>) -> Self {
        rows.into_iter()
            .fold(Self::default(), |balances, row| {
                balances.with(row.account, row.initial_balance)
            })
    }

    pub fn get(&self, account: AccountId) -> f64 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn set(&mut self, account: AccountId, amount: f64) {
        self.balances.insert(account, amount);
    }

    /// Returns a copy with `account` set to `amount`.
    pub fn with(mut self, account: AccountId, amount: f64) -> Self {
        self.set(account, amount);
        self
    }

    /// Iterates over every account and its starting balance.
    pub fn iter(&self) -> impl Iterator<Item = (AccountId, f64)> + '_ {
        self.balances.iter().map(|(&a, &b)| (a, b))
    }
}

impl From<BTreeMap<AccountId, f64>> for InitialBalances {
    fn from(value: BTreeMap<AccountId, f64>) -> Self {
        value
            .into_iter()
            .fold(Self::default(), |balances, (a, b)| balances.with(a, b))
    }
}

impl From<InitialBalances> for BTreeMap<AccountId, f64> {
    fn from(value: InitialBalances) -> Self {
        value.balances
    }
}

/// A row of the `account_balances` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountBalance {
    pub(crate) id: String,
    pub(crate) account: AccountId,
    pub(crate) initial_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) updated_at: Option<String>,
}

impl AccountBalance {
    pub fn new(id: impl Into<String>, account: AccountId, initial_balance: f64) -> Self {
        Self {
            id: id.into(),
            account,
            initial_balance,
            updated_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fully_populated() {
        let balances = InitialBalances::default();
        let accounts: Vec<AccountId> = balances.iter().map(|(a, _)| a).collect();
        assert_eq!(accounts, AccountId::ALL.to_vec());
        assert_eq!(balances.get(AccountId::BancoProvincia), 0.0);
    }

    #[test]
    fn test_deserialize_fills_missing_accounts() {
        let balances: InitialBalances = serde_json::from_str(r#"{"cash": 1000.5}"#).unwrap();
        assert_eq!(balances.get(AccountId::Cash), 1000.5);
        assert_eq!(balances.get(AccountId::BancoProvincia), 0.0);
        assert_eq!(balances.iter().count(), 2);
    }

    #[test]
    fn test_serialize_uses_account_keys() {
        let balances = InitialBalances::new(1000.0, 5000.0);
        let json = serde_json::to_value(&balances).unwrap();
        assert_eq!(json["cash"], 1000.0);
        assert_eq!(json["banco_provincia"], 5000.0);
    }

    #[test]
    fn test_from_rows_last_row_wins() {
        let rows = vec![
            AccountBalance::new("1", AccountId::Cash, 10.0),
            AccountBalance::new("2", AccountId::Cash, 20.0),
        ];
        let balances = InitialBalances::from_rows(&rows);
        assert_eq!(balances.get(AccountId::Cash), 20.0);
        assert_eq!(balances.get(AccountId::BancoProvincia), 0.0);
    }

    #[test]
    fn test_account_strings() {
        assert_eq!(AccountId::BancoProvincia.to_string(), "banco_provincia");
        assert_eq!("cash".parse::<AccountId>().unwrap(), AccountId::Cash);
        assert!("other".parse::<AccountId>().is_err());
    }
}
