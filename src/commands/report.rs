//! Read-only commands: balances, the monthly summary and the listings.

use crate::args::{PeriodArgs, TransactionsArgs};
use crate::commands::{plural, resolve_period, today, Out};
use crate::format::{format_currency, format_date};
use crate::ledger::{paginate, Ledger, Page, Snapshot, TransactionFilter};
use crate::model::{AccountId, Category, Transaction, TransactionType};
use crate::store::Mode;
use crate::summary::MonthlySummary;
use crate::{Config, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// The current balance of every account and their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balances {
    pub accounts: BTreeMap<AccountId, f64>,
    pub total: f64,
}

impl Balances {
    pub(crate) fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            accounts: AccountId::ALL
                .iter()
                .map(|&a| (a, snapshot.balance(a)))
                .collect(),
            total: snapshot.total_balance(),
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut s = String::new();
        for (account, amount) in &self.accounts {
            let _ = writeln!(s, "{:<16} {:>18}", account.label(), format_currency(*amount));
        }
        let _ = write!(s, "{:<16} {:>18}", "Total", format_currency(self.total));
        s
    }
}

/// Reports the current balance of each account and the total.
pub async fn balance(config: Config, mode: Mode) -> Result<Out<Balances>> {
    let ledger = Ledger::open(&config, mode).await?;
    let balances = Balances::from_snapshot(&ledger.snapshot());
    Ok(Out::new(balances.render(), balances))
}

/// Reports the opening balance, income, expenses and closing balance of a month, overall and per
/// account.
pub async fn summary(config: Config, mode: Mode, args: PeriodArgs) -> Result<Out<MonthlySummary>> {
    let ledger = Ledger::open(&config, mode).await?;
    let period = resolve_period(&args, today());
    let summary = ledger.snapshot().period_summary(period);

    let mut message = format!("Summary for {}\n", summary.period);
    let rows = [
        ("Opening balance", summary.initial_balance),
        ("Income", summary.total_income),
        ("Expenses", summary.total_expense),
        ("Closing balance", summary.final_balance),
    ];
    for (label, amount) in rows {
        let _ = writeln!(message, "{label:<16} {:>18}", format_currency(amount));
    }
    for account in AccountId::ALL {
        let opening = summary
            .account_initial_balances
            .get(&account)
            .copied()
            .unwrap_or_default();
        let closing = summary
            .account_final_balances
            .get(&account)
            .copied()
            .unwrap_or_default();
        let _ = write!(
            message,
            "\n{:<16} {:>18} -> {}",
            account.label(),
            format_currency(opening),
            format_currency(closing)
        );
    }
    Ok(Out::new(message, summary))
}

/// Lists one page of the transactions of a month, or of all time with `--all`, newest first.
pub async fn transactions(
    config: Config,
    mode: Mode,
    args: TransactionsArgs,
) -> Result<Out<Page<Transaction>>> {
    let ledger = Ledger::open(&config, mode).await?;
    let snapshot = ledger.snapshot();
    let filter = TransactionFilter::new(args.kind(), args.search());

    let (found, scope) = if args.all() {
        (snapshot.matching_transactions(&filter), "all time".to_string())
    } else {
        let period = resolve_period(args.period(), today());
        (snapshot.filtered_transactions(period, &filter), period.to_string())
    };
    let found: Vec<Transaction> = found.into_iter().cloned().collect();
    let page = paginate(found, args.page());

    if page.total_items == 0 {
        return Ok(Out::new(format!("No transactions for {scope}"), page));
    }

    let mut message = format!(
        "{} for {scope}, page {} of {}",
        plural(page.total_items, "transaction", "transactions"),
        page.number,
        page.total_pages
    );
    for t in &page.items {
        let _ = write!(message, "\n{}", transaction_line(&snapshot, t));
    }
    Ok(Out::new(message, page))
}

/// Lists the categories, income first.
pub async fn categories(config: Config, mode: Mode) -> Result<Out<Vec<Category>>> {
    let ledger = Ledger::open(&config, mode).await?;
    let snapshot = ledger.snapshot();
    let categories = snapshot.categories().to_vec();

    let mut message = plural(categories.len(), "category", "categories");
    for r#type in [TransactionType::Income, TransactionType::Expense] {
        let _ = write!(message, "\n{}:", r#type);
        for c in categories.iter().filter(|c| c.category_type() == r#type) {
            let _ = write!(message, "\n  {} (id {})", c.name(), c.id());
        }
    }
    Ok(Out::new(message, categories))
}

pub(crate) fn transaction_line(snapshot: &Snapshot, t: &Transaction) -> String {
    let mut line = format!(
        "{}  {:<15}  {:<14}  {:>16}  {}",
        format_date(t.date()),
        t.account().label(),
        snapshot.category_name(t.category_id()),
        format_currency(t.signed_amount()),
        t.description()
    );
    if let Some(vendor) = t.vendor() {
        let _ = write!(line, " / {vendor}");
    }
    if let Some(check_number) = t.check_number() {
        let _ = write!(line, " / check {check_number}");
    }
    let _ = write!(line, "  [id {}]", t.id());
    line
}
