//! Implements the `Store` trait on a local SQLite file.

use crate::error::Res;
use crate::model::{
    AccountBalance, AccountId, Category, CategoryUpdates, InitialBalances, NewCategory,
    NewTransaction, Transaction, TransactionType, TransactionUpdates,
};
use crate::store::{migrations, Store};
use crate::utils;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub(crate) struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and migrates its schema to the current version.
    pub(crate) async fn open(path: &Path) -> Res<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .context("Failed to parse SQLite connection string")?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

        let version = migrations::bootstrap(&pool).await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        debug!("Opened SQLite store at {}", path.display());
        Ok(Self { pool })
    }

    async fn get_category(&self, id: &str) -> Res<Category> {
        let row = sqlx::query("SELECT id, name, type, created_at FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Unable to read category")?
            .with_context(|| format!("Category not found: {id}"))?;
        category_from_row(&row)
    }

    async fn get_transaction(&self, id: &str) -> Res<Transaction> {
        let row = sqlx::query(&format!("{SELECT_TRANSACTIONS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Unable to read transaction")?
            .with_context(|| format!("Transaction not found: {id}"))?;
        transaction_from_row(&row)
    }
}

const SELECT_TRANSACTIONS: &str = "SELECT id, type, account, category_id, amount, date, \
    description, vendor, check_number, receipt, created_at FROM transactions";

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn list_categories(&self) -> Res<Vec<Category>> {
        trace!("list_categories");
        let rows = sqlx::query("SELECT id, name, type, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Unable to list categories")?;
        rows.iter().map(category_from_row).collect()
    }

    async fn insert_category(&self, category: &NewCategory) -> Res<Category> {
        let id = utils::generate_id();
        sqlx::query("INSERT INTO categories (id, name, type) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&category.name)
            .bind(category.r#type.to_string())
            .execute(&self.pool)
            .await
            .context("Unable to insert category")?;
        self.get_category(&id).await
    }

    async fn update_category(&self, id: &str, updates: &CategoryUpdates) -> Res<()> {
        if updates.is_empty() {
            return self.get_category(id).await.map(|_| ());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        {
            let mut fields = qb.separated(", ");
            if let Some(name) = &updates.name {
                fields.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(t) = updates.r#type {
                fields.push("type = ").push_bind_unseparated(t.to_string());
            }
        }
        qb.push(" WHERE id = ").push_bind(id);
        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("Unable to update category")?;
        if result.rows_affected() == 0 {
            bail!("Category not found: {id}");
        }
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> Res<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Unable to delete category")?;
        if result.rows_affected() == 0 {
            bail!("Category not found: {id}");
        }
        Ok(())
    }

    async fn list_transactions(&self) -> Res<Vec<Transaction>> {
        trace!("list_transactions");
        let rows = sqlx::query(&format!(
            "{SELECT_TRANSACTIONS} ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Unable to list transactions")?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn insert_transaction(&self, t: &NewTransaction) -> Res<Transaction> {
        let id = utils::generate_id();
        sqlx::query(
            "INSERT INTO transactions (id, type, account, category_id, amount, date, description, \
            vendor, check_number, receipt) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(t.r#type.to_string())
        .bind(t.account.to_string())
        .bind(&t.category_id)
        .bind(t.amount)
        .bind(t.date.format(DATE_FORMAT).to_string())
        .bind(&t.description)
        .bind(&t.vendor)
        .bind(&t.check_number)
        .bind(&t.receipt)
        .execute(&self.pool)
        .await
        .context("Unable to insert transaction")?;
        self.get_transaction(&id).await
    }

    async fn update_transaction(&self, id: &str, u: &TransactionUpdates) -> Res<()> {
        if u.is_empty() {
            return self.get_transaction(id).await.map(|_| ());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE transactions SET ");
        {
            let mut fields = qb.separated(", ");
            if let Some(t) = u.r#type {
                fields.push("type = ").push_bind_unseparated(t.to_string());
            }
            if let Some(account) = u.account {
                fields.push("account = ").push_bind_unseparated(account.to_string());
            }
            if let Some(category_id) = &u.category_id {
                fields.push("category_id = ").push_bind_unseparated(category_id.clone());
            }
            if let Some(amount) = u.amount {
                fields.push("amount = ").push_bind_unseparated(amount);
            }
            if let Some(date) = u.date {
                fields
                    .push("date = ")
                    .push_bind_unseparated(date.format(DATE_FORMAT).to_string());
            }
            if let Some(description) = &u.description {
                fields.push("description = ").push_bind_unseparated(description.clone());
            }
            // An empty string clears the column.
            if let Some(vendor) = &u.vendor {
                fields.push("vendor = ").push_bind_unseparated(nullable(vendor));
            }
            if let Some(check_number) = &u.check_number {
                fields
                    .push("check_number = ")
                    .push_bind_unseparated(nullable(check_number));
            }
            if let Some(receipt) = &u.receipt {
                fields.push("receipt = ").push_bind_unseparated(nullable(receipt));
            }
        }
        qb.push(" WHERE id = ").push_bind(id);
        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("Unable to update transaction")?;
        if result.rows_affected() == 0 {
            bail!("Transaction not found: {id}");
        }
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Unable to delete transaction")?;
        if result.rows_affected() == 0 {
            bail!("Transaction not found: {id}");
        }
        Ok(())
    }

    async fn list_balances(&self) -> Res<InitialBalances> {
        let rows = sqlx::query("SELECT id, account, initial_balance FROM account_balances")
            .fetch_all(&self.pool)
            .await
            .context("Unable to list account balances")?;
        let mut balances = Vec::with_capacity(rows.len());
        for row in &rows {
            let account: String = row.try_get("account")?;
            match AccountId::from_str(&account) {
                Ok(account) => balances.push(AccountBalance::new(
                    row.try_get::<String, _>("id")?,
                    account,
                    row.try_get("initial_balance")?,
                )),
                Err(_) => warn!("Ignoring the balance of unknown account '{account}'"),
            }
        }
        Ok(InitialBalances::from_rows(&balances))
    }

    async fn set_balance(&self, account: AccountId, amount: f64) -> Res<()> {
        sqlx::query(
            "INSERT INTO account_balances (id, account, initial_balance) VALUES (?, ?, ?) \
            ON CONFLICT(account) DO UPDATE SET initial_balance = excluded.initial_balance, \
            updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
        )
        .bind(utils::generate_id())
        .bind(account.to_string())
        .bind(amount)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to set the balance of {account}"))?;
        Ok(())
    }
}

fn nullable(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn category_from_row(row: &SqliteRow) -> Res<Category> {
    let id: String = row.try_get("id")?;
    let r#type: String = row.try_get("type")?;
    Ok(Category {
        r#type: TransactionType::from_str(&r#type)
            .with_context(|| format!("Category {id} has an invalid type '{}'", r#type))?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        id,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Res<Transaction> {
    let id: String = row.try_get("id")?;
    let r#type: String = row.try_get("type")?;
    let account: String = row.try_get("account")?;
    let date: String = row.try_get("date")?;
    Ok(Transaction {
        r#type: TransactionType::from_str(&r#type)
            .with_context(|| format!("Transaction {id} has an invalid type '{}'", r#type))?,
        account: AccountId::from_str(&account)
            .with_context(|| format!("Transaction {id} has an invalid account '{account}'"))?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("Transaction {id} has an invalid date '{date}'"))?,
        category_id: row.try_get("category_id")?,
        amount: row.try_get("amount")?,
        description: row.try_get("description")?,
        vendor: row.try_get("vendor")?,
        check_number: row.try_get("check_number")?,
        receipt: row.try_get("receipt")?,
        created_at: row.try_get("created_at")?,
        id,
    })
}
