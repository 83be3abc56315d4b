//! One-time adoption of records stored under historical key names.
//!
//! The sweep runs in two phases. The write phase copies each legacy payload
//! to the current key, re-stamped with the current schema, and reads it back.
//! Only once every write has been attempted does the deletion phase remove
//! the legacy keys whose copies verified.

use serde_json::Value;

use super::driver::StorageDriver;
use super::record::{self, SCHEMA_VERSION};
use crate::error::StorageError;
use crate::settings::{each_category, Category};

/// Historical keys per category, oldest last.
pub const LEGACY_KEYS: &[(Category, &[&str])] = &[
    (Category::Line, &["dxf-viewer-line-settings", "line-settings"]),
    (Category::Text, &["dxf-viewer-text-settings", "text-settings"]),
    (Category::Grip, &["dxf-viewer-grip-settings", "grip-settings"]),
    (Category::Grid, &["rulers-grid-settings-grid", "grid-settings"]),
    (Category::Ruler, &["rulers-grid-settings-ruler", "ruler-settings"]),
    (Category::Cursor, &["dxf-viewer-cursor-settings", "cursor-settings"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated,
    /// Copied and verified, but the legacy key could not be removed.
    MigratedLegacyRetained(String),
    /// A current-schema record already exists; the legacy key is left alone.
    SkippedCurrentPresent,
    NoLegacyRecord,
    Failed(String),
}

impl MigrationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Migrated => "migrated",
            Self::MigratedLegacyRetained(_) => "migrated-legacy-retained",
            Self::SkippedCurrentPresent => "skipped-current-present",
            Self::NoLegacyRecord => "no-legacy-record",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome for one legacy key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMigration {
    pub category: Category,
    pub legacy_key: &'static str,
    pub outcome: MigrationOutcome,
}

/// Run the sweep over [`LEGACY_KEYS`].
pub async fn migrate_legacy(driver: &dyn StorageDriver, now_millis: u64) -> Vec<KeyMigration> {
    migrate_keys(driver, LEGACY_KEYS, now_millis).await
}

pub(crate) async fn migrate_keys(
    driver: &dyn StorageDriver,
    table: &[(Category, &'static [&'static str])],
    now_millis: u64,
) -> Vec<KeyMigration> {
    let mut report = Vec::new();

    for (category, legacy_keys) in table {
        for &legacy_key in legacy_keys.iter() {
            let outcome = match migrate_one(driver, *category, legacy_key, now_millis).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(category = %category, legacy_key, error = %e, "legacy migration failed");
                    MigrationOutcome::Failed(e.to_string())
                }
            };
            report.push(KeyMigration {
                category: *category,
                legacy_key,
                outcome,
            });
        }
    }

    // Deletion phase: only keys whose copy verified.
    for entry in report.iter_mut() {
        if entry.outcome != MigrationOutcome::Migrated {
            continue;
        }
        if let Err(e) = driver.remove(entry.legacy_key).await {
            tracing::warn!(legacy_key = entry.legacy_key, error = %e, "failed to remove legacy record");
            entry.outcome = MigrationOutcome::MigratedLegacyRetained(e.to_string());
        }
    }

    report
}

async fn migrate_one(
    driver: &dyn StorageDriver,
    category: Category,
    legacy_key: &str,
    now_millis: u64,
) -> Result<MigrationOutcome, StorageError> {
    let Some(legacy) = driver.get(legacy_key).await? else {
        return Ok(MigrationOutcome::NoLegacyRecord);
    };
    let current_key = record::record_key(category);
    // A record from another schema would be discarded at load; replace it.
    let current = driver.get(&current_key).await?;
    if current.as_deref().is_some_and(record::is_current_schema) {
        return Ok(MigrationOutcome::SkippedCurrentPresent);
    }

    let payload = legacy_payload(&legacy)?;
    let encoded = each_category!(category, |T| {
        let layers = record::layers_from_general::<T>(payload);
        record::encode(&layers, Some(legacy_key), now_millis)?
    });

    driver.set(&current_key, &encoded).await?;
    let read_back = driver.get(&current_key).await?;
    if read_back.as_deref() != Some(encoded.as_str()) {
        return Err(StorageError::Verification(format!(
            "{current_key} did not read back as written"
        )));
    }

    tracing::info!(
        category = %category,
        legacy_key,
        schema = SCHEMA_VERSION,
        "adopted legacy settings record"
    );
    Ok(MigrationOutcome::Migrated)
}

/// The settings object inside a legacy record. Some historical writers
/// wrapped the fields in a `general` (or `settings`) object.
fn legacy_payload(raw: &str) -> Result<Value, StorageError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut fields) = value else {
        return Err(StorageError::Unavailable(
            "legacy record is not a JSON object".into(),
        ));
    };
    for wrapper in ["general", "settings"] {
        if let Some(Value::Object(inner)) = fields.remove(wrapper) {
            return Ok(Value::Object(inner));
        }
    }
    Ok(Value::Object(fields))
}
