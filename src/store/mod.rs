//! The settings store: every category's layers and the mutation API.
//!
//! The store is a plain value. It does no I/O and never fails a mutation;
//! invalid field values are repaired on the way in. Concurrency is the
//! runtime's job: one actor owns the store and publishes snapshots of it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::mode::{self, ViewerMode};
use crate::settings::{
    each_category, Category, CursorSettings, EffectiveSettings, GridSettings, GripSettings,
    LineSettings, RulerSettings, SettingsRecord, TextSettings,
};

mod command;
mod layers;
pub mod templates;

pub use command::SettingsCommand;
pub use layers::CategoryLayers;

/// Result of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub category: Category,
    /// False when the call left every layer as it was.
    pub changed: bool,
    /// Category revision after the call.
    pub revision: u64,
}

/// One category's full layer set, detached from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryState {
    Line(CategoryLayers<LineSettings>),
    Text(CategoryLayers<TextSettings>),
    Grip(CategoryLayers<GripSettings>),
    Grid(CategoryLayers<GridSettings>),
    Ruler(CategoryLayers<RulerSettings>),
    Cursor(CategoryLayers<CursorSettings>),
}

impl CategoryState {
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

    pub fn revision(&self) -> u64 {
        match self {
            Self::Line(layers) => layers.revision(),
            Self::Text(layers) => layers.revision(),
            Self::Grip(layers) => layers.revision(),
            Self::Grid(layers) => layers.revision(),
            Self::Ruler(layers) => layers.revision(),
            Self::Cursor(layers) => layers.revision(),
        }
    }

    /// Name of the template last applied to the general layer.
    pub fn active_template(&self) -> Option<&str> {
        match self {
            Self::Line(layers) => layers.active_template(),
            Self::Text(layers) => layers.active_template(),
            Self::Grip(layers) => layers.active_template(),
            Self::Grid(layers) => layers.active_template(),
            Self::Ruler(layers) => layers.active_template(),
            Self::Cursor(layers) => layers.active_template(),
        }
    }
}

/// Whether a snapshot from another instance replaced local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    Applied { revision: u64 },
    Stale { local: u64, incoming: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsStore {
    pub(crate) line: CategoryLayers<LineSettings>,
    pub(crate) text: CategoryLayers<TextSettings>,
    pub(crate) grip: CategoryLayers<GripSettings>,
    pub(crate) grid: CategoryLayers<GridSettings>,
    pub(crate) ruler: CategoryLayers<RulerSettings>,
    pub(crate) cursor: CategoryLayers<CursorSettings>,
}

impl SettingsStore {
    /// Every category at factory defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers<T: SettingsRecord>(&self) -> &CategoryLayers<T> {
        T::layers(self)
    }

    /// Typed read: effective settings for `T` in `mode`.
    pub fn effective<T: SettingsRecord>(&self, mode: ViewerMode) -> Arc<T> {
        self.layers::<T>().effective(mode)
    }

    /// Dynamic read used by caches and subscribers.
    pub fn get_effective(&self, category: Category, mode: ViewerMode) -> EffectiveSettings {
        each_category!(category, |T| T::wrap(self.effective::<T>(mode)))
    }

    /// Name-based read; unknown names are programmer errors.
    pub fn get_effective_named(
        &self,
        category: &str,
        mode: &str,
    ) -> Result<EffectiveSettings, ConfigurationError> {
        let category = category.parse::<Category>()?;
        let mode = mode.parse::<ViewerMode>()?;
        Ok(self.get_effective(category, mode))
    }

    pub fn revision(&self, category: Category) -> u64 {
        each_category!(category, |T| self.layers::<T>().revision())
    }

    pub fn update_general<T: SettingsRecord>(&mut self, partial: T::Partial) -> MutationOutcome {
        self.mutate::<T>(|layers| layers.update_general(partial))
    }

    pub fn update_specific<T: SettingsRecord>(
        &mut self,
        mode: ViewerMode,
        partial: T::Partial,
    ) -> MutationOutcome {
        let mode = mode::map(mode);
        self.mutate::<T>(|layers| layers.update_specific(mode, partial))
    }

    pub fn update_override<T: SettingsRecord>(
        &mut self,
        mode: ViewerMode,
        partial: T::Partial,
    ) -> MutationOutcome {
        let mode = mode::map(mode);
        self.mutate::<T>(|layers| layers.update_override(mode, partial))
    }

    pub fn set_override_enabled<T: SettingsRecord>(
        &mut self,
        mode: ViewerMode,
        enabled: bool,
    ) -> MutationOutcome {
        let mode = mode::map(mode);
        self.mutate::<T>(|layers| layers.set_override_enabled(mode, enabled))
    }

    pub fn apply_template<T: SettingsRecord>(&mut self, name: &str, settings: T) -> MutationOutcome {
        self.mutate::<T>(|layers| layers.apply_template(name, settings))
    }

    pub fn update_template_override<T: SettingsRecord>(
        &mut self,
        partial: T::Partial,
    ) -> MutationOutcome {
        self.mutate::<T>(|layers| layers.update_template_override(partial))
    }

    pub fn clear_template_override<T: SettingsRecord>(&mut self) -> MutationOutcome {
        self.mutate::<T>(CategoryLayers::clear_template_override)
    }

    pub fn reset_to_factory<T: SettingsRecord>(&mut self) -> MutationOutcome {
        self.mutate::<T>(CategoryLayers::reset_to_factory)
    }

    pub fn reset_mode<T: SettingsRecord>(&mut self, mode: ViewerMode) -> MutationOutcome {
        let mode = mode::map(mode);
        self.mutate::<T>(|layers| layers.reset_mode(mode))
    }

    /// Detached copy of one category's layers.
    pub fn state(&self, category: Category) -> CategoryState {
        each_category!(category, |T| T::wrap_state(self.layers::<T>().clone()))
    }

    /// Install a category's layers wholesale (hydration from storage).
    pub fn replace_state(&mut self, state: CategoryState) {
        match state {
            CategoryState::Line(layers) => self.line = layers,
            CategoryState::Text(layers) => self.text = layers,
            CategoryState::Grip(layers) => self.grip = layers,
            CategoryState::Grid(layers) => self.grid = layers,
            CategoryState::Ruler(layers) => self.ruler = layers,
            CategoryState::Cursor(layers) => self.cursor = layers,
        }
    }

    /// Install a snapshot from another instance only if its stamp is strictly
    /// newer than the local one.
    pub fn accept_remote(&mut self, state: CategoryState) -> RemoteOutcome {
        let local = self.revision(state.category());
        let incoming = state.revision();
        if incoming <= local {
            return RemoteOutcome::Stale { local, incoming };
        }
        self.replace_state(state);
        RemoteOutcome::Applied { revision: incoming }
    }

    fn mutate<T: SettingsRecord>(
        &mut self,
        change: impl FnOnce(&mut CategoryLayers<T>) -> bool,
    ) -> MutationOutcome {
        let layers = T::layers_mut(self);
        let changed = change(layers);
        let revision = if changed {
            layers.bump_revision()
        } else {
            layers.revision()
        };
        MutationOutcome {
            category: T::CATEGORY,
            changed,
            revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Color, GridPartial, LinePartial};

    #[test]
    fn worked_example_hover_line() {
        let mut store = SettingsStore::new();
        assert_eq!(store.layers::<LineSettings>().general().color, Color::from("#FFFFFF"));

        store.update_specific::<LineSettings>(
            ViewerMode::Hover,
            LinePartial {
                color: Some(Color::from("#FF8C00")),
                ..Default::default()
            },
        );
        let hover = store.effective::<LineSettings>(ViewerMode::Hover);
        assert_eq!(hover.color, Color::from("#FF8C00"));
        assert_eq!(hover.line_width, store.layers::<LineSettings>().general().line_width);

        store.set_override_enabled::<LineSettings>(ViewerMode::Hover, true);
        store.update_override::<LineSettings>(
            ViewerMode::Hover,
            LinePartial {
                opacity: Some(0.5),
                ..Default::default()
            },
        );
        let hover = store.effective::<LineSettings>(ViewerMode::Hover);
        assert_eq!(hover.color, Color::from("#FF8C00"));
        assert_eq!(hover.opacity, 0.5);
    }

    #[test]
    fn preview_writes_land_on_draft() {
        let mut store = SettingsStore::new();
        store.update_override::<GridSettings>(
            ViewerMode::Preview,
            GridPartial {
                spacing: Some(25.0),
                ..Default::default()
            },
        );
        let layers = store.layers::<GridSettings>();
        assert!(layers.override_for(crate::mode::StorageMode::Draft).is_some());
    }

    #[test]
    fn revisions_only_move_on_change() {
        let mut store = SettingsStore::new();
        let first = store.update_general::<LineSettings>(LinePartial {
            opacity: Some(0.7),
            ..Default::default()
        });
        assert!(first.changed);
        assert_eq!(first.revision, 1);

        let repeat = store.update_general::<LineSettings>(LinePartial {
            opacity: Some(0.7),
            ..Default::default()
        });
        assert!(!repeat.changed);
        assert_eq!(repeat.revision, 1);
        assert_eq!(store.revision(Category::Text), 0);
    }

    #[test]
    fn named_lookup_reports_unknown_names() {
        let store = SettingsStore::new();
        assert!(store.get_effective_named("grid", "preview").is_ok());
        assert_eq!(
            store.get_effective_named("hatch", "normal").unwrap_err(),
            ConfigurationError::UnknownCategory("hatch".into())
        );
        assert_eq!(
            store.get_effective_named("grid", "idle").unwrap_err(),
            ConfigurationError::UnknownMode("idle".into())
        );
    }

    #[test]
    fn remote_snapshots_need_a_newer_stamp() {
        let mut local = SettingsStore::new();
        let mut remote = SettingsStore::new();
        remote.update_general::<LineSettings>(LinePartial {
            line_width: Some(2.5),
            ..Default::default()
        });

        let snapshot = remote.state(Category::Line);
        assert_eq!(
            local.accept_remote(snapshot.clone()),
            RemoteOutcome::Applied { revision: 1 }
        );
        assert_eq!(local.layers::<LineSettings>().general().line_width, 2.5);
        assert_eq!(
            local.accept_remote(snapshot),
            RemoteOutcome::Stale {
                local: 1,
                incoming: 1
            }
        );
    }
}
