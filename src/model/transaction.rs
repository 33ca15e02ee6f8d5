use crate::model::{AccountId, TransactionType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single income or expense movement on one of the treasury accounts.
///
/// `amount` is always a positive magnitude; whether it adds to or subtracts from the account is
/// decided by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) r#type: TransactionType,
    pub(crate) account: AccountId,
    pub(crate) category_id: String,
    pub(crate) amount: f64,
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) check_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) receipt: Option<String>,
    /// Set by the store, never written by us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
}

impl Transaction {
    /// Creates a transaction from an insert payload and the ID the store assigned to it.
    pub fn new(id: impl Into<String>, new: NewTransaction) -> Self {
        Self {
            id: id.into(),
            r#type: new.r#type,
            account: new.account,
            category_id: new.category_id,
            amount: new.amount,
            date: new.date,
            description: new.description,
            vendor: new.vendor,
            check_number: new.check_number,
            receipt: new.receipt,
            created_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.r#type
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The amount with the sign given by the transaction type: positive for income, negative for
    /// expense.
    pub fn signed_amount(&self) -> f64 {
        self.r#type.sign() * self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn check_number(&self) -> Option<&str> {
        self.check_number.as_deref()
    }

    pub fn receipt(&self) -> Option<&str> {
        self.receipt.as_deref()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    /// Overwrites the fields that are set in `updates`. For the optional text fields an empty
    /// string clears the value.
    pub fn apply(&mut self, updates: &TransactionUpdates) {
        if let Some(t) = updates.r#type {
            self.r#type = t;
        }
        if let Some(account) = updates.account {
            self.account = account;
        }
        if let Some(category_id) = &updates.category_id {
            self.category_id = category_id.clone();
        }
        if let Some(amount) = updates.amount {
            self.amount = amount;
        }
        if let Some(date) = updates.date {
            self.date = date;
        }
        if let Some(description) = &updates.description {
            self.description = description.clone();
        }
        if let Some(vendor) = &updates.vendor {
            self.vendor = non_empty(vendor);
        }
        if let Some(check_number) = &updates.check_number {
            self.check_number = non_empty(check_number);
        }
        if let Some(receipt) = &updates.receipt {
            self.receipt = non_empty(receipt);
        }
    }
}

/// The insert payload for a transaction. The store assigns the ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewTransaction {
    pub r#type: TransactionType,
    pub account: AccountId,
    pub category_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

impl NewTransaction {
    /// Creates an insert payload with the required fields. The optional fields start out empty.
    pub fn new(
        r#type: TransactionType,
        account: AccountId,
        category_id: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            r#type,
            account,
            category_id: category_id.into(),
            amount,
            date,
            description: description.into(),
            vendor: None,
            check_number: None,
            receipt: None,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = non_empty(&vendor.into());
        self
    }

    pub fn with_check_number(mut self, check_number: impl Into<String>) -> Self {
        self.check_number = non_empty(&check_number.into());
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = non_empty(&receipt.into());
        self
    }
}

/// A partial update of a transaction. Fields that are `None` are left unchanged. For `vendor`,
/// `check_number` and `receipt`, `Some("")` clears the stored value.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

impl TransactionUpdates {
    pub fn is_empty(&self) -> bool {
        self == &TransactionUpdates::default()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
