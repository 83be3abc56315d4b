//! Environment overrides.
//!
//! `STYLESTACK_*` variables win over anything read from a config file.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::Config;

pub(super) const ENV_STORAGE_DIR: &str = "STYLESTACK_STORAGE_DIR";
pub(super) const ENV_DEBOUNCE_MS: &str = "STYLESTACK_DEBOUNCE_MS";
pub(super) const ENV_LOG: &str = "STYLESTACK_LOG";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(dir) = non_blank(env_lookup(ENV_STORAGE_DIR)) {
        config.storage.dir = PathBuf::from(dir);
    }
    if let Some(raw) = non_blank(env_lookup(ENV_DEBOUNCE_MS)) {
        config.persistence.debounce_ms = raw.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_DEBOUNCE_MS} value `{raw}`: expected non-negative integer milliseconds"
            ))
        })?;
    }
    if let Some(filter) = non_blank(env_lookup(ENV_LOG)) {
        config.logging.filter = filter;
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
