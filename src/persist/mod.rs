//! Persistence gateway: versioned load/save of category layers against a
//! pluggable storage driver.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::StorageError;
use crate::settings::{each_category, Category};
use crate::store::{CategoryState, SettingsStore};

mod driver;
mod file;
mod migrate;
mod record;
mod saver;

pub use driver::{MemoryDriver, StorageDriver};
pub use file::FileDriver;
pub use migrate::{KeyMigration, MigrationOutcome, LEGACY_KEYS};
pub use record::{decode, encode, record_key, Decoded, LoadStatus, SCHEMA_VERSION};
pub use saver::{SaveStatus, SaverHandle};

/// Default delay between the last change and the write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Load outcome for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLoad {
    pub category: Category,
    pub status: LoadStatus,
}

#[derive(Clone)]
pub struct PersistenceGateway {
    driver: Arc<dyn StorageDriver>,
}

impl PersistenceGateway {
    pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
        Self { driver }
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Adopt records stored under historical keys. Run once before the
    /// first load.
    pub async fn migrate_legacy(&self) -> Vec<KeyMigration> {
        migrate::migrate_legacy(self.driver.as_ref(), now_unix_millis()).await
    }

    /// Read one category. Never fails; an unreadable record yields factory
    /// defaults with the problem in the status.
    pub async fn load_category(&self, category: Category) -> (CategoryState, LoadStatus) {
        let key = record::record_key(category);
        match self.driver.get(&key).await {
            Ok(raw) => {
                let (state, status) = record::decode_state(category, raw.as_deref());
                match &status {
                    LoadStatus::Loaded | LoadStatus::Defaults => {
                        tracing::debug!(category = %category, status = %status, "settings loaded")
                    }
                    _ => tracing::warn!(category = %category, status = %status, "settings record replaced by defaults"),
                }
                (state, status)
            }
            Err(e) => {
                tracing::warn!(category = %category, driver = self.driver_name(), error = %e, "failed to read settings");
                let (state, _) = record::decode_state(category, None);
                (state, LoadStatus::Unreadable(e.to_string()))
            }
        }
    }

    /// Build a store from every category's stored record.
    pub async fn load_all(&self) -> (SettingsStore, Vec<CategoryLoad>) {
        let mut store = SettingsStore::new();
        let mut report = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let (state, status) = self.load_category(category).await;
            store.replace_state(state);
            report.push(CategoryLoad { category, status });
        }
        tracing::info!(
            driver = self.driver_name(),
            loaded = report.iter().filter(|entry| entry.status == LoadStatus::Loaded).count(),
            "settings store hydrated"
        );
        (store, report)
    }

    /// Write one category's layers from `store` immediately.
    pub async fn save_category(
        &self,
        store: &SettingsStore,
        category: Category,
    ) -> Result<(), StorageError> {
        let encoded = each_category!(category, |T| record::encode(
            store.layers::<T>(),
            None,
            now_unix_millis()
        ))?;
        self.driver.set(&record::record_key(category), &encoded).await
    }

    /// Delete one category's record so the next load starts from defaults.
    pub async fn remove_category(&self, category: Category) -> Result<(), StorageError> {
        self.driver.remove(&record::record_key(category)).await
    }

    /// Start a debounced background saver over this gateway.
    pub fn spawn_saver(&self, debounce: Duration) -> SaverHandle {
        saver::spawn(self.clone(), debounce)
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("driver", &self.driver_name())
            .finish()
    }
}

/// Current Unix timestamp in milliseconds.
pub(crate) fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
