//! Configuration file handling for the treasury ledger.
//!
//! The configuration file is stored at `$TREASURY_HOME/config.json` and says which store holds the
//! ledger data: a hosted REST backend or a local SQLite file.

use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "treasury";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const API_KEY: &str = "api_key";
const CONFIG_JSON: &str = "config.json";
const TREASURY_SQLITE: &str = "treasury.sqlite";

/// Which kind of store holds the ledger data.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// A hosted PostgREST-style backend.
    Rest,
    /// A SQLite file in the treasury home directory.
    #[default]
    Sqlite,
}

serde_plain::derive_display_from_serialize!(StoreKind);
serde_plain::derive_fromstr_from_deserialize!(StoreKind);

/// The store settings given to `Config::create`.
#[derive(Debug, Clone)]
pub enum StoreSetup<'a> {
    /// Use the hosted backend at `store_url`. The API key is read from `api_key`, which is copied
    /// into the secrets directory.
    Rest { store_url: &'a str, api_key: &'a Path },
    /// Use a SQLite file in the home directory.
    Sqlite,
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$TREASURY_HOME` and from there it loads `$TREASURY_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the treasury home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its secrets subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/treasury`
    /// - `setup` - Which store to use. For the REST store the API key file is copied to its
    ///   default location in the home directory.
    ///
    /// # Errors
    /// - Returns an error if the store URL is not an `http` or `https` URL, in which case nothing
    ///   is written, or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, setup: StoreSetup<'_>) -> Res<Self> {
        if let StoreSetup::Rest { store_url, .. } = setup {
            check_store_url(store_url)?;
        }
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the treasury home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = match setup {
            StoreSetup::Rest { store_url, api_key } => {
                utils::copy(api_key, secrets.join(API_KEY))
                    .await
                    .context("Unable to copy the API key into the secrets directory")?;
                ConfigFile {
                    store: StoreKind::Rest,
                    store_url: store_url.to_string(),
                    ..ConfigFile::default()
                }
            }
            StoreSetup::Sqlite => ConfigFile {
                store: StoreKind::Sqlite,
                ..ConfigFile::default()
            },
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `treasury_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(treasury_home: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = treasury_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Treasury home is missing, run 'treasury init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn store(&self) -> StoreKind {
        self.config_file.store
    }

    pub fn store_url(&self) -> &str {
        &self.config_file.store_url
    }

    /// Returns the stored `api_key_path` if it is absolute, otherwise resolves the relative path.
    pub fn api_key_path(&self) -> PathBuf {
        self.resolve(self.config_file.api_key_path())
    }

    /// Returns the stored `sqlite_path` if it is absolute, otherwise resolves the relative path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.resolve(self.config_file.sqlite_path())
    }

    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "treasury",
///   "config_version": 1,
///   "store": "rest",
///   "store_url": "https://xyzcompany.supabase.co",
///   "api_key_path": ".secrets/api_key"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "treasury"
    app_name: String,

    config_version: u8,

    #[serde(default)]
    store: StoreKind,

    /// Base URL of the hosted backend. Only used by the REST store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    store_url: String,

    /// Path to the file holding the backend API key (relative to the home directory or absolute).
    /// Defaults to $TREASURY_HOME/.secrets/api_key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key_path: Option<PathBuf>,

    /// Path to the SQLite file (relative to the home directory or absolute).
    /// Defaults to $TREASURY_HOME/treasury.sqlite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            store: StoreKind::default(),
            store_url: String::new(),
            api_key_path: None,
            sqlite_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates a config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, if `app_name` is wrong, or if the
    /// REST store is selected without a `store_url`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.store != StoreKind::Rest || !config.store_url.is_empty(),
            "The config file at {} selects the rest store but has no store_url",
            path.display()
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    fn api_key_path(&self) -> PathBuf {
        self.api_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_KEY))
    }

    fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TREASURY_SQLITE))
    }
}

/// The store URL must parse and use `http` or `https`.
fn check_store_url(store_url: &str) -> Res<()> {
    let url =
        Url::parse(store_url).with_context(|| format!("The store URL '{store_url}' is invalid"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "The store URL '{store_url}' must use http or https, not '{}'",
            url.scheme()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_rest() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("treasury_home");
        let key_file = dir.path().join("key.txt");
        utils::write(&key_file, "anon-key-123").await.unwrap();
        let store_url = "https://abc.supabase.co";

        let config = Config::create(
            &home_dir,
            StoreSetup::Rest {
                store_url,
                api_key: &key_file,
            },
        )
        .await
        .unwrap();

        assert_eq!(config.store(), StoreKind::Rest);
        assert_eq!(config.store_url(), store_url);
        assert!(config.secrets().is_dir());
        let key = utils::read(&config.api_key_path()).await.unwrap();
        assert_eq!(key, "anon-key-123");

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.store(), StoreKind::Rest);
        assert_eq!(loaded.api_key_path(), config.api_key_path());
    }

    #[tokio::test]
    async fn test_config_create_rejects_non_http_url() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("treasury_home");
        let key_file = dir.path().join("key.txt");
        utils::write(&key_file, "anon-key-123").await.unwrap();

        for store_url in ["ftp://example.com", "file:///tmp/store", "not a url"] {
            let result = Config::create(
                &home_dir,
                StoreSetup::Rest {
                    store_url,
                    api_key: &key_file,
                },
            )
            .await;
            assert!(result.is_err(), "{store_url}");
        }
        assert!(!home_dir.join(CONFIG_JSON).exists());
        assert!(!home_dir.exists());
    }

    #[tokio::test]
    async fn test_config_create_sqlite() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), StoreSetup::Sqlite).await.unwrap();
        assert_eq!(config.store(), StoreKind::Sqlite);
        assert_eq!(config.store_url(), "");
        assert_eq!(config.sqlite_path(), config.root().join("treasury.sqlite"));

        let content = utils::read(config.config_path()).await.unwrap();
        assert!(!content.contains("store_url"));
        assert!(content.contains(r#""store": "sqlite""#));
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let key_file = dir.path().join("key.txt");
        utils::write(&key_file, "k").await.unwrap();
        let result = Config::create(
            dir.path().join("home"),
            StoreSetup::Rest {
                store_url: "not a url",
                api_key: &key_file,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(format!("{err:#}").contains("treasury init"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{"app_name": "bookkeeper", "config_version": 1}"#)
            .await
            .unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_rest_requires_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(
            &path,
            r#"{"app_name": "treasury", "config_version": 1, "store": "rest"}"#,
        )
        .await
        .unwrap();
        assert!(ConfigFile::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_custom_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(
            &path,
            r#"{
                "app_name": "treasury",
                "config_version": 1,
                "store": "sqlite",
                "sqlite_path": "/var/lib/treasury/ledger.sqlite",
                "api_key_path": "keys/anon"
            }"#,
        )
        .await
        .unwrap();
        let file = ConfigFile::load(&path).await.unwrap();
        assert_eq!(
            file.sqlite_path(),
            PathBuf::from("/var/lib/treasury/ledger.sqlite")
        );
        assert_eq!(file.api_key_path(), PathBuf::from("keys/anon"));
    }

    #[test]
    fn test_config_file_default() {
        let file = ConfigFile::default();
        assert_eq!(file.app_name, "treasury");
        assert_eq!(file.store, StoreKind::Sqlite);
        assert_eq!(file.api_key_path(), PathBuf::from(".secrets/api_key"));
    }
}
