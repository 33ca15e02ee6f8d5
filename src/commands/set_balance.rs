use crate::args::SetBalanceArgs;
use crate::commands::{Balances, Out};
use crate::error::{Error, Result};
use crate::format::format_currency;
use crate::ledger::Ledger;
use crate::store::Mode;
use crate::Config;

/// Sets the starting balance of an account. Negative amounts are allowed since an account can
/// start out overdrawn.
pub async fn set_balance(
    config: Config,
    mode: Mode,
    args: SetBalanceArgs,
) -> Result<Out<Balances>> {
    if !args.amount().is_finite() {
        return Err(Error::validation(format!(
            "The starting balance must be a number, got {}",
            args.amount()
        )));
    }
    let mut ledger = Ledger::open(&config, mode).await?;
    let snapshot = ledger
        .set_initial_balance(args.account(), args.amount())
        .await?;
    let balances = Balances::from_snapshot(&snapshot);
    let message = format!(
        "Set the starting balance of {} to {}\n{}",
        args.account().label(),
        format_currency(args.amount()),
        balances.render()
    );
    Ok(Out::new(message, balances))
}
