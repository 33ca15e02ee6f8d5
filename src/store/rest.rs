//! Implements the `Store` trait against a hosted PostgREST-style backend, where each table is
//! exposed at `{store_url}/rest/v1/{table}`.

use crate::error::Res;
use crate::model::{
    AccountBalance, AccountId, Category, CategoryUpdates, InitialBalances, NewCategory,
    NewTransaction, Transaction, TransactionType, TransactionUpdates,
};
use crate::store::{Store, ACCOUNT_BALANCES, CATEGORIES, TRANSACTIONS};
use anyhow::{bail, ensure, Context};
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, trace};
use url::Url;

/// A client for the hosted backend. Requests carry the API key both as the `apikey` header and as
/// a bearer token.
#[derive(Debug, Clone)]
pub(crate) struct RestStore {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RestStore {
    pub(crate) fn new(store_url: &str, api_key: &str) -> Res<Self> {
        let mut base = Url::parse(store_url)
            .with_context(|| format!("The store URL '{store_url}' is invalid"))?;
        ensure!(
            matches!(base.scheme(), "http" | "https"),
            "The store URL must use http or https, got '{store_url}'"
        );
        ensure!(!api_key.is_empty(), "The store API key is empty");
        // Without a trailing slash `Url::join` would replace the last path segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, table: &str) -> Res<Url> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .with_context(|| format!("Unable to build the URL for {table}"))
    }

    fn request(&self, method: Method, table: &str) -> Res<RequestBuilder> {
        let url = self.endpoint(table)?;
        trace!("{method} {url}");
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key))
    }

    /// A request that asks the backend to return the affected rows.
    fn returning(&self, method: Method, table: &str) -> Res<RequestBuilder> {
        Ok(self
            .request(method, table)?
            .header("Prefer", "return=representation"))
    }

    /// Fails if no row of `table` has `id`.
    async fn ensure_exists(&self, table: &str, id: &str, what: &str) -> Res<()> {
        let request = self
            .request(Method::GET, table)?
            .query(&[("select", "id")])
            .query(&[("id", format!("eq.{id}"))]);
        let rows: Vec<Value> = json_body(send(request, what).await?, what).await?;
        if rows.is_empty() {
            bail!("{} not found: {id}", capitalize(what));
        }
        Ok(())
    }

    /// Sends a PATCH or DELETE for row `id` and fails if it matched nothing.
    async fn change_by_id(
        &self,
        method: Method,
        table: &str,
        id: &str,
        body: Option<Value>,
        what: &str,
    ) -> Res<()> {
        let mut request = self
            .returning(method, table)?
            .query(&[("id", format!("eq.{id}"))]);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let rows: Vec<Value> = json_body(send(request, what).await?, what).await?;
        if rows.is_empty() {
            bail!("{} not found: {id}", capitalize(what));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for RestStore {
    async fn list_categories(&self) -> Res<Vec<Category>> {
        let request = self
            .request(Method::GET, CATEGORIES)?
            .query(&[("select", "*"), ("order", "name.asc")]);
        let rows: Vec<CategoryRow> =
            json_body(send(request, "category").await?, "category list").await?;
        debug!("Fetched {} categories", rows.len());
        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }

    async fn insert_category(&self, category: &NewCategory) -> Res<Category> {
        let request = self.returning(Method::POST, CATEGORIES)?.json(category);
        let rows: Vec<CategoryRow> =
            json_body(send(request, "category").await?, "category insert").await?;
        rows.into_iter()
            .next()
            .map(CategoryRow::into_category)
            .context("The store did not return the inserted category")
    }

    async fn update_category(&self, id: &str, updates: &CategoryUpdates) -> Res<()> {
        if updates.is_empty() {
            return self.ensure_exists(CATEGORIES, id, "category").await;
        }
        let body = serde_json::to_value(updates).context("Unable to serialize category")?;
        self.change_by_id(Method::PATCH, CATEGORIES, id, Some(body), "category")
            .await
    }

    async fn delete_category(&self, id: &str) -> Res<()> {
        self.change_by_id(Method::DELETE, CATEGORIES, id, None, "category")
            .await
    }

    async fn list_transactions(&self) -> Res<Vec<Transaction>> {
        let request = self
            .request(Method::GET, TRANSACTIONS)?
            .query(&[("select", "*"), ("order", "date.desc")]);
        let rows: Vec<TransactionRow> =
            json_body(send(request, "transaction").await?, "transaction list").await?;
        debug!("Fetched {} transactions", rows.len());
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn insert_transaction(&self, transaction: &NewTransaction) -> Res<Transaction> {
        let request = self.returning(Method::POST, TRANSACTIONS)?.json(transaction);
        let rows: Vec<TransactionRow> =
            json_body(send(request, "transaction").await?, "transaction insert").await?;
        match rows.into_iter().next() {
            Some(row) => row.into_transaction(),
            None => bail!("The store did not return the inserted transaction"),
        }
    }

    async fn update_transaction(&self, id: &str, updates: &TransactionUpdates) -> Res<()> {
        if updates.is_empty() {
            return self.ensure_exists(TRANSACTIONS, id, "transaction").await;
        }
        let body = transaction_patch(updates)?;
        self.change_by_id(Method::PATCH, TRANSACTIONS, id, Some(body), "transaction")
            .await
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        self.change_by_id(Method::DELETE, TRANSACTIONS, id, None, "transaction")
            .await
    }

    async fn list_balances(&self) -> Res<InitialBalances> {
        let request = self
            .request(Method::GET, ACCOUNT_BALANCES)?
            .query(&[("select", "*")]);
        let rows: Vec<BalanceRow> =
            json_body(send(request, "balance").await?, "balance list").await?;
        balances_from_rows(rows)
    }

    async fn set_balance(&self, account: AccountId, amount: f64) -> Res<()> {
        let filter = [("account", format!("eq.{account}"))];
        let request = self
            .request(Method::GET, ACCOUNT_BALANCES)?
            .query(&[("select", "id")])
            .query(&filter);
        let existing: Vec<Value> = json_body(send(request, "balance").await?, "balance").await?;

        let request = if existing.is_empty() {
            self.request(Method::POST, ACCOUNT_BALANCES)?
                .json(&json!({ "account": account, "initial_balance": amount }))
        } else {
            self.request(Method::PATCH, ACCOUNT_BALANCES)?
                .query(&filter)
                .json(&json!({ "initial_balance": amount }))
        };
        send(request, "balance").await?;
        Ok(())
    }
}

/// Sends the request and fails with the response body if the status is not a success.
async fn send(request: RequestBuilder, what: &str) -> Res<Response> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send the {what} request to the store"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("The {what} request failed with status {status}: {body}");
    }
    Ok(response)
}

async fn json_body<T>(response: Response, what: &str) -> Res<T>
where
    T: DeserializeOwned,
{
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the {what} response"))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Serializes a transaction update. An empty vendor, check number or receipt is sent as `null`,
/// which clears the column.
fn transaction_patch(updates: &TransactionUpdates) -> Res<Value> {
    let mut body = serde_json::to_value(updates).context("Unable to serialize transaction")?;
    if let Some(map) = body.as_object_mut() {
        for field in ["vendor", "check_number", "receipt"] {
            if map.get(field).and_then(Value::as_str) == Some("") {
                map.insert(field.to_string(), Value::Null);
            }
        }
    }
    Ok(body)
}

/// Folds balance rows into `InitialBalances`, skipping rows for accounts we do not know about.
fn balances_from_rows(rows: Vec<BalanceRow>) -> Res<InitialBalances> {
    let mut balances = Vec::with_capacity(rows.len());
    for row in rows {
        match AccountId::from_str(&row.account) {
            Ok(account) => balances.push(AccountBalance {
                initial_balance: row.initial_balance.value()?,
                id: row.id.into(),
                account,
                updated_at: row.updated_at,
            }),
            Err(_) => debug!("Ignoring the balance of unknown account '{}'", row.account),
        }
    }
    Ok(InitialBalances::from_rows(&balances))
}

/// Record IDs may be text (e.g. UUIDs) or integers depending on how the table was created.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Integer(i64),
}

impl From<Id> for String {
    fn from(value: Id) -> Self {
        match value {
            Id::Text(s) => s,
            Id::Integer(i) => i.to_string(),
        }
    }
}

/// `numeric` columns can be rendered either as JSON numbers or as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Res<f64> {
        match self {
            Numeric::Number(n) => Ok(*n),
            Numeric::Text(s) => s
                .trim()
                .parse()
                .with_context(|| format!("'{s}' is not a number")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: Id,
    name: String,
    r#type: TransactionType,
    #[serde(default)]
    created_at: Option<String>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id.into(),
            name: self.name,
            r#type: self.r#type,
            created_at: self.created_at,
        }
    }
}

/// A transaction as the backend returns it. Older tables have no `vendor` column and carry the
/// vendor in `supplier` instead; `supplier` is only read when the row has no `vendor` key.
#[derive(Debug, Deserialize)]
struct TransactionRow {
    id: Id,
    r#type: TransactionType,
    account: AccountId,
    category_id: Id,
    amount: Numeric,
    date: NaiveDate,
    description: String,
    #[serde(default, deserialize_with = "present")]
    vendor: Option<Option<String>>,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    check_number: Option<String>,
    #[serde(default)]
    receipt: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self) -> Res<Transaction> {
        let id: String = self.id.into();
        let amount = self
            .amount
            .value()
            .with_context(|| format!("Transaction {id} has an invalid amount"))?;
        Ok(Transaction {
            r#type: self.r#type,
            account: self.account,
            category_id: self.category_id.into(),
            amount,
            date: self.date,
            description: self.description,
            vendor: match self.vendor {
                Some(vendor) => non_empty(vendor),
                None => non_empty(self.supplier),
            },
            check_number: non_empty(self.check_number),
            receipt: non_empty(self.receipt),
            created_at: self.created_at,
            id,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Tells a key that is present with a `null` value apart from a missing key, which stays `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct BalanceRow {
    id: Id,
    account: String,
    initial_balance: Numeric,
    #[serde(default)]
    updated_at: Option<String>,
}
