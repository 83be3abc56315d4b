//! Unified error types for the settings engine.
//!
//! Validation problems inside settings values are never errors: they are
//! clamped or substituted where they occur. The types here cover programmer
//! errors (unknown names), storage driver failures, runtime-config loading,
//! and a closed runtime actor.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigurationError
// ---------------------------------------------------------------------------

/// Programmer errors: a caller named something the engine does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownCategory(String),
    UnknownMode(String),
    UnknownTemplate { category: String, name: String },
    /// A payload for one category was handed to another category's layers.
    CategoryMismatch { expected: String, found: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory(name) => write!(f, "unknown category `{name}`"),
            Self::UnknownMode(name) => write!(f, "unknown mode `{name}`"),
            Self::UnknownTemplate { category, name } => {
                write!(f, "unknown template `{name}` for category `{category}`")
            }
            Self::CategoryMismatch { expected, found } => {
                write!(f, "expected `{expected}` settings, found `{found}`")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors raised by a storage driver or the record codec.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The backing store cannot be used at all (missing, closed, read-only).
    Unavailable(String),
    /// A written record did not read back identically.
    Verification(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Json(e) => write!(f, "json: {e}"),
            Self::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Self::Verification(msg) => write!(f, "verification failed: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing the runtime configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// RuntimeError
// ---------------------------------------------------------------------------

/// Errors surfaced by the runtime handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The actor task has stopped and no longer accepts commands.
    Closed,
    Configuration(ConfigurationError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "settings runtime is closed"),
            Self::Configuration(e) => write!(f, "configuration: {e}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigurationError> for RuntimeError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}
