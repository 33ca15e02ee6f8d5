//! These structs provide the CLI interface for the treasury CLI.

use crate::model::{AccountId, TransactionType};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// treasury: A command-line ledger for a school cooperative's treasury.
///
/// Records income and expense transactions on the cooperative's two accounts, petty cash ("Caja
/// Chica") and the Banco Provincia account, files them under categories, and reports balances and
/// monthly summaries.
///
/// The data is kept either in a hosted backend (see `treasury init --store-url`) or in a local
/// SQLite file (`treasury init --local`).
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the treasury home directory and its configuration file.
    ///
    /// This is the first command you should run. Choose where the data lives:
    ///
    /// - In a hosted backend: pass its base URL as --store-url and the path to a file holding the
    ///   API key as --api-key. The key file is copied into the home directory.
    ///
    /// - In a SQLite file inside the home directory: pass --local.
    Init(InitArgs),
    /// Show the current balance of each account and the total.
    Balance,
    /// Show the opening balance, income, expenses and closing balance of a month.
    Summary(PeriodArgs),
    /// List the transactions of a month, or of every month with --all.
    Transactions(TransactionsArgs),
    /// List the categories.
    Categories,
    /// Add a transaction or a category.
    Insert(InsertArgs),
    /// Change a transaction or a category.
    Update(UpdateArgs),
    /// Delete transactions or a category.
    Delete(DeleteArgs),
    /// Set the starting balance of an account.
    SetBalance(SetBalanceArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where treasury data and configuration is held. Defaults to ~/treasury
    #[arg(long, env = "TREASURY_HOME", default_value_t = default_treasury_home())]
    treasury_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, treasury_home: PathBuf) -> Self {
        Self {
            log_level,
            treasury_home: treasury_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn treasury_home(&self) -> &DisplayPath {
        &self.treasury_home
    }
}

/// Args for the `treasury init` command.
#[derive(Debug, Parser, Clone)]
#[command(group(ArgGroup::new("backend").required(true).args(["store_url", "local"])))]
pub struct InitArgs {
    /// The base URL of the hosted backend, e.g. https://xyzcompany.supabase.co
    #[arg(long, requires = "api_key", conflicts_with = "local")]
    store_url: Option<String>,

    /// The path to a file holding the backend API key. It will be copied to the default secrets
    /// location in the home directory.
    #[arg(long, requires = "store_url")]
    api_key: Option<PathBuf>,

    /// Keep the data in a SQLite file in the home directory instead of a hosted backend.
    #[arg(long)]
    local: bool,
}

impl InitArgs {
    pub fn rest(store_url: impl Into<String>, api_key: impl Into<PathBuf>) -> Self {
        Self {
            store_url: Some(store_url.into()),
            api_key: Some(api_key.into()),
            local: false,
        }
    }

    pub fn local() -> Self {
        Self {
            store_url: None,
            api_key: None,
            local: true,
        }
    }

    pub fn store_url(&self) -> Option<&str> {
        self.store_url.as_deref()
    }

    pub fn api_key(&self) -> Option<&Path> {
        self.api_key.as_deref()
    }

    pub fn is_local(&self) -> bool {
        self.local
    }
}

/// Selects a calendar month. Either part defaults to the current month or year.
#[derive(Debug, Default, Parser, Clone)]
pub struct PeriodArgs {
    /// The month, 1 (January) to 12 (December).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// The four-digit year.
    #[arg(long)]
    year: Option<i32>,
}

impl PeriodArgs {
    pub fn new(month: Option<u32>, year: Option<i32>) -> Self {
        Self { month, year }
    }

    /// The 1-based month, if given.
    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Args for the `treasury transactions` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct TransactionsArgs {
    #[clap(flatten)]
    period: PeriodArgs,

    /// Only list income or expense transactions.
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<TransactionType>,

    /// Only list transactions whose description, category, vendor or check number contains this
    /// text (ignoring case).
    #[arg(long)]
    search: Option<String>,

    /// List transactions of every month instead of a single one.
    #[arg(long, conflicts_with_all = ["month", "year"])]
    all: bool,

    /// The page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: usize,
}

impl TransactionsArgs {
    pub fn new(period: PeriodArgs, kind: Option<TransactionType>, search: Option<String>) -> Self {
        Self {
            period,
            kind,
            search,
            all: false,
            page: 1,
        }
    }

    pub fn with_all(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn period(&self) -> &PeriodArgs {
        &self.period
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn all(&self) -> bool {
        self.all
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

/// Args for the `treasury insert` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Record an income or expense.
    Transaction(Box<InsertTransactionArgs>),
    /// Add a category.
    Category(InsertCategoryArgs),
}

/// Args for `treasury insert transaction`.
#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    /// Whether this is income or an expense.
    #[arg(long = "type", value_name = "TYPE")]
    kind: TransactionType,

    /// The account the money came into or went out of.
    #[arg(long)]
    account: AccountId,

    /// The ID of the category. It must have the same type as the transaction.
    #[arg(long)]
    category: String,

    /// The amount, a positive number.
    #[arg(long)]
    amount: f64,

    /// The date, YYYY-MM-DD. Defaults to today. Cannot be in the future.
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long)]
    description: String,

    /// Who was paid or who paid, at most 100 characters.
    #[arg(long)]
    vendor: Option<String>,

    /// The check number. Shorter numbers are padded with leading zeros to 8 digits.
    #[arg(long)]
    check_number: Option<String>,

    /// A receipt or voucher reference.
    #[arg(long)]
    receipt: Option<String>,
}

impl InsertTransactionArgs {
    pub fn new(
        kind: TransactionType,
        account: AccountId,
        category: impl Into<String>,
        amount: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            account,
            category: category.into(),
            amount,
            date: None,
            description: description.into(),
            vendor: None,
            check_number: None,
            receipt: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_check_number(mut self, check_number: impl Into<String>) -> Self {
        self.check_number = Some(check_number.into());
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
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
}

/// Args for `treasury insert category`.
#[derive(Debug, Parser, Clone)]
pub struct InsertCategoryArgs {
    /// The category name. It must be unique, ignoring case, among categories of the same type.
    #[arg(long)]
    name: String,

    /// Whether the category files income or expenses.
    #[arg(long = "type", value_name = "TYPE")]
    kind: TransactionType,
}

impl InsertCategoryArgs {
    pub fn new(name: impl Into<String>, kind: TransactionType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }
}

/// Args for the `treasury update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[command(subcommand)]
    entity: UpdateSubcommand,
}

impl UpdateArgs {
    pub fn entity(&self) -> &UpdateSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Change the fields of a transaction.
    Transaction(Box<UpdateTransactionArgs>),
    /// Rename a category or change its type.
    Category(UpdateCategoryArgs),
}

/// Args for `treasury update transaction`. Only the given fields are changed. Passing an empty
/// string for --vendor, --check-number or --receipt clears it.
#[derive(Debug, Default, Parser, Clone)]
pub struct UpdateTransactionArgs {
    /// The ID of the transaction to change.
    #[arg(long)]
    id: String,

    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<TransactionType>,

    #[arg(long)]
    account: Option<AccountId>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    amount: Option<f64>,

    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    vendor: Option<String>,

    #[arg(long)]
    check_number: Option<String>,

    #[arg(long)]
    receipt: Option<String>,
}

impl UpdateTransactionArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_check_number(mut self, check_number: impl Into<String>) -> Self {
        self.check_number = Some(check_number.into());
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }

    pub fn account(&self) -> Option<AccountId> {
        self.account
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
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
}

/// Args for `treasury update category`.
#[derive(Debug, Parser, Clone)]
pub struct UpdateCategoryArgs {
    /// The ID of the category to change.
    #[arg(long)]
    id: String,

    /// The new name.
    #[arg(long)]
    name: Option<String>,

    /// The new type. Refused while any transaction is filed under the category.
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<TransactionType>,
}

impl UpdateCategoryArgs {
    pub fn new(
        id: impl Into<String>,
        name: Option<impl Into<String>>,
        kind: Option<TransactionType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.map(Into::into),
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> Option<TransactionType> {
        self.kind
    }
}

/// Args for the `treasury delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete one or more transactions.
    Transactions(DeleteTransactionsArgs),
    /// Delete a category. Refused while any transaction is filed under it.
    Category(DeleteCategoryArgs),
}

/// Args for `treasury delete transactions`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteTransactionsArgs {
    /// The IDs of the transactions to delete.
    #[arg(long = "id", required = true, num_args = 1..)]
    ids: Vec<String>,
}

impl DeleteTransactionsArgs {
    pub fn new<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Args for `treasury delete category`.
#[derive(Debug, Parser, Clone)]
pub struct DeleteCategoryArgs {
    /// The ID of the category to delete.
    #[arg(long)]
    id: String,
}

impl DeleteCategoryArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `treasury set-balance` command.
#[derive(Debug, Parser, Clone)]
pub struct SetBalanceArgs {
    #[arg(long)]
    account: AccountId,

    /// The balance of the account before any recorded transaction.
    #[arg(long, allow_hyphen_values = true)]
    amount: f64,
}

impl SetBalanceArgs {
    pub fn new(account: AccountId, amount: f64) -> Self {
        Self { account, amount }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

fn default_treasury_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("treasury"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --treasury-home or TREASURY_HOME instead of relying on the \
                default treasury home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("treasury")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["treasury", "--treasury-home", "/tmp/treasury"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_command_definition() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_init_requires_a_backend() {
        assert!(parse(&["init"]).is_err());
        assert!(parse(&["init", "--store-url", "https://x.supabase.co"]).is_err());
        assert!(parse(&["init", "--local", "--store-url", "https://x.supabase.co"]).is_err());

        let args = parse(&["init", "--local"]).unwrap();
        match args.command() {
            Command::Init(init) => assert!(init.is_local()),
            other => panic!("unexpected command {other:?}"),
        }

        let args = parse(&[
            "init",
            "--store-url",
            "https://x.supabase.co",
            "--api-key",
            "/tmp/key",
        ])
        .unwrap();
        match args.command() {
            Command::Init(init) => {
                assert_eq!(init.store_url(), Some("https://x.supabase.co"));
                assert_eq!(init.api_key(), Some(Path::new("/tmp/key")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_summary_month_range() {
        assert!(parse(&["summary", "--month", "0"]).is_err());
        assert!(parse(&["summary", "--month", "13"]).is_err());
        let args = parse(&["summary", "--month", "12", "--year", "2024"]).unwrap();
        match args.command() {
            Command::Summary(period) => {
                assert_eq!(period.month(), Some(12));
                assert_eq!(period.year(), Some(2024));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_insert_transaction_args() {
        let args = parse(&[
            "insert",
            "transaction",
            "--type",
            "expense",
            "--account",
            "banco_provincia",
            "--category",
            "6",
            "--amount",
            "50000",
            "--date",
            "2023-10-16",
            "--description",
            "Pago salarios",
            "--check-number",
            "12345",
        ])
        .unwrap();
        let Command::Insert(insert) = args.command() else {
            panic!("expected insert");
        };
        let InsertSubcommand::Transaction(t) = insert.entity() else {
            panic!("expected transaction");
        };
        assert_eq!(t.kind(), TransactionType::Expense);
        assert_eq!(t.account(), AccountId::BancoProvincia);
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2023, 10, 16));
        assert_eq!(t.check_number(), Some("12345"));
        assert_eq!(t.vendor(), None);
    }

    #[test]
    fn test_transactions_all_conflicts_with_period() {
        assert!(parse(&["transactions", "--all", "--month", "3"]).is_err());
        let args = parse(&["transactions", "--all", "--page", "2"]).unwrap();
        let Command::Transactions(list) = args.command() else {
            panic!("expected transactions");
        };
        assert!(list.all());
        assert_eq!(list.page(), 2);
    }

    #[test]
    fn test_negative_starting_balance() {
        let args = parse(&["set-balance", "--account", "cash", "--amount", "-500"]).unwrap();
        let Command::SetBalance(set) = args.command() else {
            panic!("expected set-balance");
        };
        assert_eq!(set.amount(), -500.0);
    }

    #[test]
    fn test_delete_transactions_ids() {
        let args = parse(&["delete", "transactions", "--id", "a", "b"]).unwrap();
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        let DeleteSubcommand::Transactions(d) = delete.entity() else {
            panic!("expected transactions");
        };
        assert_eq!(d.ids(), &["a".to_string(), "b".to_string()]);
    }
}
