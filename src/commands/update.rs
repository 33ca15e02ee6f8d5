//! Update command handlers.

use crate::args::{UpdateCategoryArgs, UpdateTransactionArgs};
use crate::commands::{today, Out};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::model::{Category, CategoryUpdates, Transaction, TransactionUpdates};
use crate::store::Mode;
use crate::validate;
use crate::Config;

/// Changes the fields of a transaction that are given in `args`. If the type or the category
/// changes, the resulting pair is checked so that a transaction always stays filed under a
/// category of its own type.
pub async fn update_transaction(
    config: Config,
    mode: Mode,
    args: UpdateTransactionArgs,
) -> Result<Out<Transaction>> {
    let updates = TransactionUpdates {
        r#type: args.kind(),
        account: args.account(),
        category_id: args.category().map(str::to_string),
        amount: args.amount(),
        date: args.date(),
        description: args.description().map(|d| d.trim().to_string()),
        vendor: args.vendor().map(|v| v.trim().to_string()),
        check_number: args
            .check_number()
            .map(|c| {
                if c.trim().is_empty() {
                    Ok(String::new())
                } else {
                    validate::normalize_check_number(c)
                }
            })
            .transpose()?,
        receipt: args.receipt().map(|r| r.trim().to_string()),
    };
    if updates.is_empty() {
        return Err(Error::validation("Nothing to update"));
    }
    validate::validate_transaction_updates(&updates, today())?;

    let mut ledger = Ledger::open(&config, mode).await?;
    let current = ledger.snapshot();
    let existing = current
        .transaction(args.id())
        .ok_or_else(|| Error::request(format!("Transaction not found: {}", args.id())))?;
    if updates.r#type.is_some() || updates.category_id.is_some() {
        validate::validate_category_choice(
            current.categories(),
            updates
                .category_id
                .as_deref()
                .unwrap_or(existing.category_id()),
            updates.r#type.unwrap_or(existing.transaction_type()),
        )?;
    }

    let snapshot = ledger.edit_transaction(args.id(), updates).await?;
    let updated = snapshot
        .transaction(args.id())
        .cloned()
        .ok_or_else(|| Error::request(format!("Transaction not found: {}", args.id())))?;
    Ok(Out::new(
        format!("Updated transaction {}", updated.id()),
        updated,
    ))
}

/// Renames a category or changes its type. The type of a category that transactions are filed
/// under cannot be changed.
pub async fn update_category(
    config: Config,
    mode: Mode,
    args: UpdateCategoryArgs,
) -> Result<Out<Category>> {
    if args.name().is_none() && args.kind().is_none() {
        return Err(Error::validation("Nothing to update"));
    }

    let mut ledger = Ledger::open(&config, mode).await?;
    let current = ledger.snapshot();
    let existing = current
        .category(args.id())
        .ok_or_else(|| Error::request(format!("Category not found: {}", args.id())))?;

    let r#type = args.kind().unwrap_or(existing.category_type());
    if r#type != existing.category_type() && current.category_in_use(args.id()) {
        return Err(Error::referential(format!(
            "The category '{}' is used by at least one transaction and its type cannot be changed",
            existing.name()
        )));
    }
    let name = validate::validate_category_name(
        current.categories(),
        args.name().unwrap_or(existing.name()),
        r#type,
        Some(args.id()),
    )?;

    let updates = CategoryUpdates {
        name: args.name().map(|_| name),
        r#type: args.kind(),
    };
    let snapshot = ledger.update_category(args.id(), updates).await?;
    let updated = snapshot
        .category(args.id())
        .cloned()
        .ok_or_else(|| Error::request(format!("Category not found: {}", args.id())))?;
    Ok(Out::new(
        format!("Updated category '{}'", updated.name()),
        updated,
    ))
}
