use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use treasury_ledger::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, UpdateSubcommand,
};
use treasury_ledger::{commands, Config, Error, ErrorType, Mode, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().treasury_home().path();

    // When TREASURY_IN_TEST_MODE is set and non-empty the mode will be Mode::Test and all commands
    // run against seeded in-memory data, otherwise the configured store is used.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args, mode).await?.print(),

        Command::Balance => commands::balance(load(home).await?, mode).await?.print(),

        Command::Summary(period) => commands::summary(load(home).await?, mode, period.clone())
            .await?
            .print(),

        Command::Transactions(list_args) => {
            commands::transactions(load(home).await?, mode, list_args.clone())
                .await?
                .print()
        }

        Command::Categories => commands::categories(load(home).await?, mode).await?.print(),

        Command::Insert(insert_args) => {
            let config = load(home).await?;
            match insert_args.entity() {
                InsertSubcommand::Transaction(args) => {
                    commands::insert_transaction(config, mode, *args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Category(args) => {
                    commands::insert_category(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Update(update_args) => {
            let config = load(home).await?;
            match update_args.entity() {
                UpdateSubcommand::Transaction(args) => {
                    commands::update_transaction(config, mode, *args.clone())
                        .await?
                        .print()
                }
                UpdateSubcommand::Category(args) => {
                    commands::update_category(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Delete(delete_args) => {
            let config = load(home).await?;
            match delete_args.entity() {
                DeleteSubcommand::Transactions(args) => {
                    commands::delete_transactions(config, mode, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Category(args) => {
                    commands::delete_category(config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::SetBalance(balance_args) => {
            commands::set_balance(load(home).await?, mode, balance_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

async fn load(home: &Path) -> Result<Config> {
    Config::load(home)
        .await
        .map_err(|e| Error::new(ErrorType::Config, e))
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "treasury_ledger",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
