//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::config::StoreSetup;
use crate::store::MemoryStore;
use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up a treasury home directory with a Config. Commands run against it
/// with `Mode::Test` use an in-memory store that is private to this environment and seeded with
/// demo data. Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("treasury");
        let config = Config::create(&root, StoreSetup::Sqlite).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// The in-memory store that `Mode::Test` selects for this environment.
    pub fn store(&self) -> MemoryStore {
        MemoryStore::new(self.config.root())
    }
}
