//! Serializable mutation commands and the reducer that applies them.
//!
//! Every write to the store can be expressed as one `SettingsCommand`, which
//! is what the runtime actor queues and what the CLI accepts as JSON, e.g.
//! `{"updateOverride":{"mode":"hover","patch":{"line":{"opacity":0.5}}}}`.

use serde::{Deserialize, Serialize};

use super::{MutationOutcome, SettingsStore};
use crate::mode::ViewerMode;
use crate::settings::{each_category, Category, CategoryPatch, CategoryValue, SettingsRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingsCommand {
    UpdateGeneral(CategoryPatch),
    UpdateSpecific {
        mode: ViewerMode,
        patch: CategoryPatch,
    },
    UpdateOverride {
        mode: ViewerMode,
        patch: CategoryPatch,
    },
    SetOverrideEnabled {
        category: Category,
        mode: ViewerMode,
        enabled: bool,
    },
    ApplyTemplate {
        name: String,
        settings: CategoryValue,
    },
    UpdateTemplateOverride(CategoryPatch),
    ClearTemplateOverride {
        category: Category,
    },
    ResetToFactory {
        category: Category,
    },
    ResetMode {
        category: Category,
        mode: ViewerMode,
    },
}

impl SettingsCommand {
    /// The single category this command touches.
    pub fn category(&self) -> Category {
        match self {
            Self::UpdateGeneral(patch)
            | Self::UpdateSpecific { patch, .. }
            | Self::UpdateOverride { patch, .. }
            | Self::UpdateTemplateOverride(patch) => patch.category(),
            Self::ApplyTemplate { settings, .. } => settings.category(),
            Self::SetOverrideEnabled { category, .. }
            | Self::ClearTemplateOverride { category }
            | Self::ResetToFactory { category }
            | Self::ResetMode { category, .. } => *category,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateGeneral(_) => "update_general",
            Self::UpdateSpecific { .. } => "update_specific",
            Self::UpdateOverride { .. } => "update_override",
            Self::SetOverrideEnabled { .. } => "set_override_enabled",
            Self::ApplyTemplate { .. } => "apply_template",
            Self::UpdateTemplateOverride(_) => "update_template_override",
            Self::ClearTemplateOverride { .. } => "clear_template_override",
            Self::ResetToFactory { .. } => "reset_to_factory",
            Self::ResetMode { .. } => "reset_mode",
        }
    }
}

impl SettingsStore {
    /// Apply one command. Never fails; an unchanged outcome means no-op.
    pub fn apply(&mut self, command: SettingsCommand) -> MutationOutcome {
        let category = command.category();
        each_category!(category, |T| self.apply_typed::<T>(command))
    }

    fn apply_typed<T: SettingsRecord>(&mut self, command: SettingsCommand) -> MutationOutcome {
        let partial = |patch: &CategoryPatch| T::downcast_patch(patch).cloned().unwrap_or_default();
        match command {
            SettingsCommand::UpdateGeneral(patch) => self.update_general::<T>(partial(&patch)),
            SettingsCommand::UpdateSpecific { mode, patch } => {
                self.update_specific::<T>(mode, partial(&patch))
            }
            SettingsCommand::UpdateOverride { mode, patch } => {
                self.update_override::<T>(mode, partial(&patch))
            }
            SettingsCommand::SetOverrideEnabled { mode, enabled, .. } => {
                self.set_override_enabled::<T>(mode, enabled)
            }
            SettingsCommand::ApplyTemplate { name, settings } => match T::downcast_value(settings) {
                Ok(settings) => self.apply_template::<T>(&name, settings),
                Err(_) => self.unchanged::<T>(),
            },
            SettingsCommand::UpdateTemplateOverride(patch) => {
                self.update_template_override::<T>(partial(&patch))
            }
            SettingsCommand::ClearTemplateOverride { .. } => self.clear_template_override::<T>(),
            SettingsCommand::ResetToFactory { .. } => self.reset_to_factory::<T>(),
            SettingsCommand::ResetMode { mode, .. } => self.reset_mode::<T>(mode),
        }
    }

    fn unchanged<T: SettingsRecord>(&self) -> MutationOutcome {
        MutationOutcome {
            category: T::CATEGORY,
            changed: false,
            revision: self.layers::<T>().revision(),
        }
    }
}
