//! Runtime configuration from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`STYLESTACK_STORAGE_DIR`,
//!    `STYLESTACK_DEBOUNCE_MS`, `STYLESTACK_LOG`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./stylestack.toml in the current directory
//! 4. `<config dir>/stylestack/stylestack.toml`
//! 5. Built-in defaults
//!
//! CLI flags such as `--storage-dir` and `--memory` are applied on top by
//! the binary through [`Config::with_cli_overrides`].

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

mod defaults;
mod env;
mod loader;
mod sources;

use defaults::{
    APP_DIR_NAME, DEFAULT_DEBOUNCE_MS, DEFAULT_LOG_FILTER, FALLBACK_SETTINGS_DIR,
    SETTINGS_DIR_NAME,
};
pub use loader::{load_config, load_config_with_diagnostics};
pub use sources::ConfigSource;

/// Which storage driver backs persisted settings.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriverKind {
    #[default]
    File,
    Memory,
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageConfig,
    pub persistence: PersistenceConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub driver: StorageDriverKind,
    /// Directory for the file driver.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Attach a cross-instance bus to runtimes sharing one process. Library
    /// embedders read this; the `stylestack` binary runs a single runtime and
    /// ignores it with a warning.
    pub cross_instance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive.
    pub filter: String,
}

/// Non-fatal observations made while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    pub warnings: Vec<String>,
}

/// Config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
    pub diagnostics: ConfigDiagnostics,
}

impl Config {
    /// Built-in defaults with the record directory under `config_root`.
    pub fn defaults_with_root(config_root: Option<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                driver: StorageDriverKind::File,
                dir: default_settings_dir(config_root),
            },
            persistence: PersistenceConfig {
                debounce_ms: DEFAULT_DEBOUNCE_MS,
            },
            sync: SyncConfig {
                cross_instance: false,
            },
            logging: LoggingConfig {
                filter: DEFAULT_LOG_FILTER.to_string(),
            },
        }
    }

    /// Apply CLI flags. `memory` wins over `storage_dir`.
    pub fn with_cli_overrides(mut self, storage_dir: Option<PathBuf>, memory: bool) -> Self {
        if let Some(dir) = storage_dir {
            self.storage.driver = StorageDriverKind::File;
            self.storage.dir = dir;
        }
        if memory {
            self.storage.driver = StorageDriverKind::Memory;
        }
        self
    }

    fn from_file_config(file: FileConfig, config_root: Option<PathBuf>) -> Self {
        let mut config = Self::defaults_with_root(config_root);
        if let Some(driver) = file.storage.driver {
            config.storage.driver = driver;
        }
        if let Some(dir) = file.storage.dir.filter(|d| !d.as_os_str().is_empty()) {
            config.storage.dir = dir;
        }
        if let Some(debounce_ms) = file.persistence.debounce_ms {
            config.persistence.debounce_ms = debounce_ms;
        }
        if let Some(cross_instance) = file.sync.cross_instance {
            config.sync.cross_instance = cross_instance;
        }
        if let Some(filter) = file.logging.filter.filter(|f| !f.trim().is_empty()) {
            config.logging.filter = filter.trim().to_string();
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults_with_root(dirs::config_dir())
    }
}

fn default_settings_dir(config_root: Option<PathBuf>) -> PathBuf {
    match config_root {
        Some(root) => root.join(APP_DIR_NAME).join(SETTINGS_DIR_NAME),
        None => PathBuf::from(FALLBACK_SETTINGS_DIR),
    }
}

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    storage: FileStorage,
    persistence: FilePersistence,
    sync: FileSync,
    logging: FileLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileStorage {
    driver: Option<StorageDriverKind>,
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FilePersistence {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSync {
    cross_instance: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileLogging {
    filter: Option<String>,
}
