//! Typed settings records for every visual entity category.
//!
//! Each category has a full record (`LineSettings`, ...) whose fields are always
//! populated, and a sparse partial (`LinePartial`, ...) whose fields are
//! `Option`s. Partials are what callers write and what mode layers store; a
//! `None` field means "not set here" and never gets defaulted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::mode::StorageMode;
use crate::store::{CategoryLayers, CategoryState, SettingsStore};

mod color;
mod defaults;
mod records;
mod validate;

pub use color::Color;
pub use records::*;

/// Styleable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Line,
    Text,
    Grip,
    Grid,
    Ruler,
    Cursor,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Line,
        Self::Text,
        Self::Grip,
        Self::Grid,
        Self::Ruler,
        Self::Cursor,
    ];

    /// Stable lowercase key used for storage keys and CLI arguments.
    pub fn key(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Text => "text",
            Self::Grip => "grip",
            Self::Grid => "grid",
            Self::Ruler => "ruler",
            Self::Cursor => "cursor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.key() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownCategory(s.to_string()))
    }
}

/// Sparse patch over a settings record.
pub trait PartialSettings:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn is_empty(&self) -> bool;

    /// Copy every field that is set in `other` into `self`.
    fn merge_from(&mut self, other: &Self);

    /// Names of the fields that are set, in declaration order.
    fn present_fields(&self) -> Vec<&'static str>;
}

/// A complete, validated settings record for one category.
pub trait SettingsRecord:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Partial: PartialSettings;

    const CATEGORY: Category;

    /// Built-in factory defaults.
    fn factory() -> Self;

    /// Overwrite the fields that are set in `partial`.
    fn apply(&mut self, partial: &Self::Partial);

    /// Every field of `self` as a set partial.
    fn to_partial(&self) -> Self::Partial;

    /// Clamp or substitute invalid values in place. Fields that are not set
    /// stay unset.
    fn sanitize(partial: &mut Self::Partial);

    /// Built-in presentation deltas per mode ("hover is orange").
    fn builtin_specific() -> Vec<(StorageMode, Self::Partial)>;

    fn wrap(value: Arc<Self>) -> EffectiveSettings;

    fn wrap_patch(partial: Self::Partial) -> CategoryPatch;

    fn wrap_value(value: Self) -> CategoryValue;

    fn downcast_patch(patch: &CategoryPatch) -> Option<&Self::Partial>;

    fn downcast_value(value: CategoryValue) -> Result<Self, ConfigurationError>;

    fn downcast_effective(value: &EffectiveSettings) -> Option<&Arc<Self>>;

    fn wrap_state(layers: CategoryLayers<Self>) -> CategoryState;

    fn downcast_state(state: &CategoryState) -> Option<&CategoryLayers<Self>>;

    fn layers(store: &SettingsStore) -> &CategoryLayers<Self>;

    fn layers_mut(store: &mut SettingsStore) -> &mut CategoryLayers<Self>;

    /// A full record sanitized as a whole.
    fn sanitized(self) -> Self {
        let mut partial = self.to_partial();
        Self::sanitize(&mut partial);
        let mut record = Self::factory();
        record.apply(&partial);
        record
    }
}

/// Run `$body` with `$T` bound to the record type of `$category`.
macro_rules! each_category {
    ($category:expr, |$T:ident| $body:expr) => {
        match $category {
            $crate::settings::Category::Line => {
                type $T = $crate::settings::LineSettings;
                $body
            }
            $crate::settings::Category::Text => {
                type $T = $crate::settings::TextSettings;
                $body
            }
            $crate::settings::Category::Grip => {
                type $T = $crate::settings::GripSettings;
                $body
            }
            $crate::settings::Category::Grid => {
                type $T = $crate::settings::GridSettings;
                $body
            }
            $crate::settings::Category::Ruler => {
                type $T = $crate::settings::RulerSettings;
                $body
            }
            $crate::settings::Category::Cursor => {
                type $T = $crate::settings::CursorSettings;
                $body
            }
        }
    };
}

pub(crate) use each_category;

/// Resolved settings for one category, shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveSettings {
    Line(Arc<LineSettings>),
    Text(Arc<TextSettings>),
    Grip(Arc<GripSettings>),
    Grid(Arc<GridSettings>),
    Ruler(Arc<RulerSettings>),
    Cursor(Arc<CursorSettings>),
}

impl EffectiveSettings {
    pub fn category(&self) -> Category {
        match self {
            Self::Line(_) => Category::Line,
            Self::Text(_) => Category::Text,
            Self::Grip(_) => Category::Grip,
            Self::Grid(_) => Category::Grid,
            Self::Ruler(_) => Category::Ruler,
            Self::Cursor(_) => Category::Cursor,
        }
    }

    /// The inner record as JSON (without the category tag).
    pub fn to_json(&self) -> serde_json::Value {
        let result = match self {
            Self::Line(value) => serde_json::to_value(value.as_ref()),
            Self::Text(value) => serde_json::to_value(value.as_ref()),
            Self::Grip(value) => serde_json::to_value(value.as_ref()),
            Self::Grid(value) => serde_json::to_value(value.as_ref()),
            Self::Ruler(value) => serde_json::to_value(value.as_ref()),
            Self::Cursor(value) => serde_json::to_value(value.as_ref()),
        };
        result.unwrap_or(serde_json::Value::Null)
    }

    /// Typed view of the inner record.
    pub fn get<T: SettingsRecord>(&self) -> Option<&Arc<T>> {
        T::downcast_effective(self)
    }
}

/// A partial tagged with its category (`{"line": {"opacity": 0.5}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPatch {
    Line(LinePartial),
    Text(TextPartial),
    Grip(GripPartial),
    Grid(GridPartial),
    Ruler(RulerPartial),
    Cursor(CursorPartial),
}

impl CategoryPatch {
    pub fn category(&self) -> Category {
        match self {
            Self::Line(_) => Category::Line,
            Self::Text(_) => Category::Text,
            Self::Grip(_) => Category::Grip,
            Self::Grid(_) => Category::Grid,
            Self::Ruler(_) => Category::Ruler,
            Self::Cursor(_) => Category::Cursor,
        }
    }
}

/// A full record tagged with its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryValue {
    Line(LineSettings),
    Text(TextSettings),
    Grip(GripSettings),
    Grid(GridSettings),
    Ruler(RulerSettings),
    Cursor(CursorSettings),
}

impl CategoryValue {
    pub fn category(&self) -> Category {
        match self {
            Self::Line(_) => Category::Line,
            Self::Text(_) => Category::Text,
            Self::Grip(_) => Category::Grip,
            Self::Grid(_) => Category::Grid,
            Self::Ruler(_) => Category::Ruler,
            Self::Cursor(_) => Category::Cursor,
        }
    }

    /// Factory defaults for `category` with `patch` applied on top.
    pub fn factory_with(category: Category, patch: Option<CategoryPatch>) -> Self {
        each_category!(category, |T| {
            let mut record = T::factory();
            if let Some(patch) = patch.as_ref().and_then(T::downcast_patch) {
                record.apply(patch);
            }
            T::wrap_value(record)
        })
    }
}
