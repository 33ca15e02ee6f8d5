use crate::args::InitArgs;
use crate::commands::Out;
use crate::config::StoreSetup;
use crate::error::{Error, ErrorType, IntoResult};
use crate::store::{self, Mode};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and an initial `config.json`, then opens the
/// chosen store once. For the SQLite store this creates the database file and its schema.
///
/// # Arguments
/// - `treasury_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/treasury`
/// - `args` - Either a backend URL and API key file, or `--local`.
///
/// # Errors
/// - Returns an error if any file operation fails or if the store cannot be opened.
pub async fn init(treasury_home: &Path, args: &InitArgs, mode: Mode) -> Result<Out<()>> {
    let setup = match (args.store_url(), args.api_key()) {
        (Some(store_url), Some(api_key)) if !args.is_local() => {
            StoreSetup::Rest { store_url, api_key }
        }
        (None, None) if args.is_local() => StoreSetup::Sqlite,
        _ => {
            return Err(Error::request(
                "Pass either --store-url together with --api-key, or --local",
            ))
        }
    };

    let config = Config::create(treasury_home, setup)
        .await
        .context("Unable to create the home directory and configs")
        .pub_result(ErrorType::Config)?;

    let _store = store::open(&config, mode)
        .await
        .pub_result(ErrorType::Store)?;

    Ok(format!(
        "Successfully created the treasury home directory at {}",
        config.root().display()
    )
    .into())
}
