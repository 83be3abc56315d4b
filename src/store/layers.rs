//! The per-category layer set and its mutation primitives.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::mode::{StorageMode, ViewerMode};
use crate::resolve;
use crate::settings::{PartialSettings, SettingsRecord};

/// All layers held for one category.
///
/// Incoming partials are sanitized before they are stored; the stored partials
/// keep exactly the fields the caller set.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryLayers<T: SettingsRecord> {
    pub(crate) general: Arc<T>,
    pub(crate) specific: BTreeMap<StorageMode, T::Partial>,
    pub(crate) overrides: BTreeMap<StorageMode, T::Partial>,
    pub(crate) override_enabled: BTreeMap<StorageMode, bool>,
    pub(crate) template_override: T::Partial,
    pub(crate) active_template: Option<String>,
    /// Bumped on every change; the last-write-wins stamp across instances.
    pub(crate) revision: u64,
}

impl<T: SettingsRecord> CategoryLayers<T> {
    /// Factory general values plus the built-in presentation deltas.
    pub fn factory() -> Self {
        Self {
            general: Arc::new(T::factory()),
            specific: T::builtin_specific().into_iter().collect(),
            overrides: BTreeMap::new(),
            override_enabled: BTreeMap::new(),
            template_override: T::Partial::default(),
            active_template: None,
            revision: 0,
        }
    }

    pub fn general(&self) -> &Arc<T> {
        &self.general
    }

    pub fn specific(&self, mode: StorageMode) -> Option<&T::Partial> {
        self.specific.get(&mode)
    }

    pub fn override_for(&self, mode: StorageMode) -> Option<&T::Partial> {
        self.overrides.get(&mode)
    }

    pub fn is_override_enabled(&self, mode: StorageMode) -> bool {
        self.override_enabled.get(&mode).copied().unwrap_or(false)
    }

    pub fn template_override(&self) -> &T::Partial {
        &self.template_override
    }

    pub fn active_template(&self) -> Option<&str> {
        self.active_template.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn effective(&self, mode: ViewerMode) -> Arc<T> {
        resolve::compute_effective(self, mode)
    }

    pub fn update_general(&mut self, mut partial: T::Partial) -> bool {
        T::sanitize(&mut partial);
        let merged = resolve::merge(Arc::clone(&self.general), &partial);
        if *merged == *self.general {
            return false;
        }
        self.general = merged;
        true
    }

    pub fn update_specific(&mut self, mode: StorageMode, partial: T::Partial) -> bool {
        merge_mode_entry::<T>(&mut self.specific, mode, partial)
    }

    pub fn update_override(&mut self, mode: StorageMode, partial: T::Partial) -> bool {
        merge_mode_entry::<T>(&mut self.overrides, mode, partial)
    }

    /// Toggle the flag only; override data is kept either way.
    pub fn set_override_enabled(&mut self, mode: StorageMode, enabled: bool) -> bool {
        let previous = self.override_enabled.insert(mode, enabled);
        previous.unwrap_or(false) != enabled
    }

    pub fn apply_template(&mut self, name: &str, settings: T) -> bool {
        let settings = settings.sanitized();
        let changed = *self.general != settings
            || self.active_template.as_deref() != Some(name)
            || !self.template_override.is_empty();
        self.general = Arc::new(settings);
        self.active_template = Some(name.to_string());
        self.template_override = T::Partial::default();
        changed
    }

    pub fn update_template_override(&mut self, mut partial: T::Partial) -> bool {
        T::sanitize(&mut partial);
        let before = self.template_override.clone();
        self.template_override.merge_from(&partial);
        self.template_override != before
    }

    pub fn clear_template_override(&mut self) -> bool {
        let changed = !self.template_override.is_empty();
        self.template_override = T::Partial::default();
        changed
    }

    /// Restore factory general values and drop template state. Mode layers
    /// are independent of the base look and stay as they are.
    pub fn reset_to_factory(&mut self) -> bool {
        let factory = T::factory();
        let changed = *self.general != factory
            || self.active_template.is_some()
            || !self.template_override.is_empty();
        self.general = Arc::new(factory);
        self.active_template = None;
        self.template_override = T::Partial::default();
        changed
    }

    /// Drop the user override for one mode.
    pub fn reset_mode(&mut self, mode: StorageMode) -> bool {
        self.overrides.remove(&mode).is_some()
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

impl<T: SettingsRecord> Default for CategoryLayers<T> {
    fn default() -> Self {
        Self::factory()
    }
}

fn merge_mode_entry<T: SettingsRecord>(
    entries: &mut BTreeMap<StorageMode, T::Partial>,
    mode: StorageMode,
    mut partial: T::Partial,
) -> bool {
    if partial.is_empty() {
        return false;
    }
    T::sanitize(&mut partial);
    let entry = entries.entry(mode).or_default();
    let before = entry.clone();
    entry.merge_from(&partial);
    *entry != before
}
