//! Insert command handlers.

use crate::args::{InsertCategoryArgs, InsertTransactionArgs};
use crate::commands::{today, Out};
use crate::format::format_currency;
use crate::ledger::Ledger;
use crate::model::{Category, NewCategory, NewTransaction, Transaction};
use crate::store::Mode;
use crate::validate;
use crate::{Config, Result};

/// Records a new transaction. The date defaults to today and a check number must be digits only;
/// it is padded to eight before the rest of the input is validated.
pub async fn insert_transaction(
    config: Config,
    mode: Mode,
    args: InsertTransactionArgs,
) -> Result<Out<Transaction>> {
    let today = today();
    let mut new = NewTransaction::new(
        args.kind(),
        args.account(),
        args.category(),
        args.amount(),
        args.date().unwrap_or(today),
        args.description().trim(),
    );
    if let Some(vendor) = args.vendor().map(str::trim).filter(|v| !v.is_empty()) {
        new = new.with_vendor(vendor);
    }
    if let Some(check_number) = args.check_number().filter(|c| !c.trim().is_empty()) {
        new = new.with_check_number(validate::normalize_check_number(check_number)?);
    }
    if let Some(receipt) = args.receipt().map(str::trim).filter(|r| !r.is_empty()) {
        new = new.with_receipt(receipt);
    }
    validate::validate_new_transaction(&new, today)?;

    let mut ledger = Ledger::open(&config, mode).await?;
    validate::validate_category_choice(
        ledger.snapshot().categories(),
        &new.category_id,
        new.r#type,
    )?;

    let (snapshot, inserted) = ledger.add_transaction(new).await?;
    let message = format!(
        "Added {} of {} on {} under {} (id {})",
        inserted.transaction_type(),
        format_currency(inserted.amount()),
        inserted.account().label(),
        snapshot.category_name(inserted.category_id()),
        inserted.id()
    );
    Ok(Out::new(message, inserted))
}

/// Adds a category. The name is trimmed and must be unique, ignoring case, among categories of the
/// same type.
pub async fn insert_category(
    config: Config,
    mode: Mode,
    args: InsertCategoryArgs,
) -> Result<Out<Category>> {
    let mut ledger = Ledger::open(&config, mode).await?;
    let name = validate::validate_category_name(
        ledger.snapshot().categories(),
        args.name(),
        args.kind(),
        None,
    )?;
    let (_, inserted) = ledger
        .add_category(NewCategory::new(name, args.kind()))
        .await?;
    let message = format!(
        "Added {} category '{}' (id {})",
        inserted.category_type(),
        inserted.name(),
        inserted.id()
    );
    Ok(Out::new(message, inserted))
}
