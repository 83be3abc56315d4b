//! Interaction modes and the single place where mode aliasing happens.
//!
//! Layers are keyed by [`StorageMode`]. Consumers speak [`ViewerMode`], which
//! adds the transient `Preview` state. Every read or write of a mode-keyed
//! layer must go through [`map`] first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Modes that own persisted layer entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Normal,
    Draft,
    Hover,
    Selection,
    Completion,
}

impl StorageMode {
    pub const ALL: [StorageMode; 5] = [
        Self::Normal,
        Self::Draft,
        Self::Hover,
        Self::Selection,
        Self::Completion,
    ];

    /// Stable lowercase key used in persisted records.
    pub fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Draft => "draft",
            Self::Hover => "hover",
            Self::Selection => "selection",
            Self::Completion => "completion",
        }
    }
}

/// Modes a consumer may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    Normal,
    Draft,
    Hover,
    Selection,
    Completion,
    /// Transient alias for `Draft`; never persisted.
    Preview,
}

impl ViewerMode {
    pub const ALL: [ViewerMode; 6] = [
        Self::Normal,
        Self::Draft,
        Self::Hover,
        Self::Selection,
        Self::Completion,
        Self::Preview,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            other => map(other).key(),
        }
    }
}

/// Map a viewer mode to the storage mode whose layers it reads and writes.
pub fn map(mode: ViewerMode) -> StorageMode {
    match mode {
        ViewerMode::Normal => StorageMode::Normal,
        ViewerMode::Draft | ViewerMode::Preview => StorageMode::Draft,
        ViewerMode::Hover => StorageMode::Hover,
        ViewerMode::Selection => StorageMode::Selection,
        ViewerMode::Completion => StorageMode::Completion,
    }
}

impl From<ViewerMode> for StorageMode {
    fn from(mode: ViewerMode) -> Self {
        map(mode)
    }
}

impl From<StorageMode> for ViewerMode {
    fn from(mode: StorageMode) -> Self {
        match mode {
            StorageMode::Normal => Self::Normal,
            StorageMode::Draft => Self::Draft,
            StorageMode::Hover => Self::Hover,
            StorageMode::Selection => Self::Selection,
            StorageMode::Completion => Self::Completion,
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ViewerMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.key() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownMode(s.to_string()))
    }
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Accepts `preview` and resolves it through [`map`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ViewerMode>().map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_the_only_alias() {
        assert_eq!(map(ViewerMode::Preview), StorageMode::Draft);
        for mode in StorageMode::ALL {
            assert_eq!(map(ViewerMode::from(mode)), mode);
        }
    }

    #[test]
    fn parses_mode_names_case_insensitively() {
        assert_eq!("Hover".parse::<ViewerMode>(), Ok(ViewerMode::Hover));
        assert_eq!(" preview ".parse::<ViewerMode>(), Ok(ViewerMode::Preview));
        assert_eq!("preview".parse::<StorageMode>(), Ok(StorageMode::Draft));
    }

    #[test]
    fn unknown_mode_is_a_configuration_error() {
        let err = "ghost".parse::<ViewerMode>().unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownMode("ghost".into()));
    }

    #[test]
    fn storage_modes_serialize_lowercase() {
        let raw = serde_json::to_string(&StorageMode::Selection).expect("serialize");
        assert_eq!(raw, "\"selection\"");
    }
}
