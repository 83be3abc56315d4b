//! Default configuration constants.

/// File name looked up in the working directory and the global config dir.
pub(super) const CONFIG_FILE_NAME: &str = "stylestack.toml";
/// Directory under the platform config root that holds our files.
pub(super) const APP_DIR_NAME: &str = "stylestack";
/// Subdirectory of [`APP_DIR_NAME`] holding persisted settings records.
pub(super) const SETTINGS_DIR_NAME: &str = "settings";
/// Fallback record directory when no platform config root is known.
pub(super) const FALLBACK_SETTINGS_DIR: &str = ".stylestack/settings";
pub(super) const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub(super) const DEFAULT_LOG_FILTER: &str = "warn";
