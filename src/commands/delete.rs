//! Delete command handlers.

use crate::args::{DeleteCategoryArgs, DeleteTransactionsArgs};
use crate::commands::{plural, Out};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::model::Category;
use crate::store::Mode;
use crate::Config;

/// Deletes one or more transactions by ID.
///
/// Every ID is checked against the loaded data first, so an unknown ID fails the command before
/// anything is deleted. The deletes themselves are issued one at a time; if the store fails part
/// way through, the transactions deleted so far stay deleted.
pub async fn delete_transactions(
    config: Config,
    mode: Mode,
    args: DeleteTransactionsArgs,
) -> Result<Out<Vec<String>>> {
    let mut ledger = Ledger::open(&config, mode).await?;
    let snapshot = ledger.snapshot();
    if let Some(missing) = args
        .ids()
        .iter()
        .find(|id| snapshot.transaction(id).is_none())
    {
        return Err(Error::request(format!("Transaction not found: {missing}")));
    }

    let mut deleted = Vec::with_capacity(args.ids().len());
    for id in args.ids() {
        if deleted.contains(id) {
            continue;
        }
        ledger.delete_transaction(id).await?;
        deleted.push(id.clone());
    }

    let message = format!(
        "Deleted {}",
        plural(deleted.len(), "transaction", "transactions")
    );
    Ok(Out::new(message, deleted))
}

/// Deletes a category. Refused while any transaction is filed under it.
pub async fn delete_category(
    config: Config,
    mode: Mode,
    args: DeleteCategoryArgs,
) -> Result<Out<Category>> {
    let mut ledger = Ledger::open(&config, mode).await?;
    let category = ledger
        .snapshot()
        .category(args.id())
        .cloned()
        .ok_or_else(|| Error::request(format!("Category not found: {}", args.id())))?;
    ledger.delete_category(args.id()).await?;
    Ok(Out::new(
        format!("Deleted category '{}'", category.name()),
        category,
    ))
}
