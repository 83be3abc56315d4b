use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::env::apply_runtime_env_overrides;
use super::sources::read_config_text_with_sources;
use super::{Config, ConfigDiagnostics, FileConfig, LoadedConfig, StorageDriverKind};

/// Resolved config only; see [`load_config_with_diagnostics`].
pub fn load_config(explicit_path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_diagnostics(explicit_path).map(|loaded| loaded.config)
}

/// Read the first config file found, then apply `STYLESTACK_*` variables.
///
/// `explicit_path` comes from `--config` and must exist when given.
pub fn load_config_with_diagnostics(
    explicit_path: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    load_from_sources(
        explicit_path,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        dirs::config_dir,
    )
}

/// Loader with the filesystem, environment, and config root injected.
pub(super) fn load_from_sources<R, E, Root>(
    explicit_path: Option<&str>,
    read_file: R,
    env_var: E,
    config_root: Root,
) -> Result<LoadedConfig, ConfigError>
where
    R: Fn(&Path) -> Result<String, std::io::Error>,
    E: Fn(&str) -> Option<String>,
    Root: Fn() -> Option<PathBuf>,
{
    let (text, source) = read_config_text_with_sources(explicit_path, &read_file, &config_root)?;
    let file: FileConfig = toml::from_str(&text)?;

    let mut warnings = Vec::new();
    if file.storage.driver == Some(StorageDriverKind::Memory) && file.storage.dir.is_some() {
        warnings.push("`storage.dir` is ignored when `storage.driver = \"memory\"`".to_string());
    }

    let mut config = Config::from_file_config(file, config_root());
    apply_runtime_env_overrides(&mut config, &env_var)?;
    if config.persistence.debounce_ms == 0 {
        warnings.push("debounce is 0 ms; every change is written immediately".to_string());
    }

    Ok(LoadedConfig {
        config,
        source,
        diagnostics: ConfigDiagnostics { warnings },
    })
}
