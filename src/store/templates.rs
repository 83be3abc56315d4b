//! Named templates: swappable full replacements for a category's general
//! layer.
//!
//! Built-ins are defined as patches over the factory record so they pick up
//! any field added later. Callers may register their own templates; a
//! registered name shadows a built-in of the same name.

use std::collections::BTreeMap;

use crate::error::ConfigurationError;
use crate::settings::{
    Category, CategoryPatch, CategoryValue, Color, CursorPartial, CursorShape, GridPartial,
    GridStyle, GripPartial, LinePartial, RulerPartial, TextPartial,
};

use super::SettingsCommand;

/// Name of the template equal to factory defaults.
pub const DEFAULT_TEMPLATE: &str = "default";

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<(Category, String), CategoryValue>,
}

impl TemplateRegistry {
    /// Registry pre-filled with the built-in templates for every category.
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: BTreeMap::new(),
        };
        for category in Category::ALL {
            registry.insert(
                category,
                DEFAULT_TEMPLATE,
                CategoryValue::factory_with(category, None),
            );
        }
        for (name, patch) in builtin_patches() {
            let category = patch.category();
            registry.insert(
                category,
                name,
                CategoryValue::factory_with(category, Some(patch)),
            );
        }
        registry
    }

    /// Add or replace a template. The value's category decides where it goes.
    pub fn register(&mut self, name: &str, settings: CategoryValue) {
        self.insert(settings.category(), name, settings);
    }

    /// Template names for one category, sorted.
    pub fn names(&self, category: Category) -> Vec<&str> {
        self.templates
            .keys()
            .filter(|(owner, _)| *owner == category)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    pub fn get(&self, category: Category, name: &str) -> Result<&CategoryValue, ConfigurationError> {
        self.templates
            .get(&(category, normalize_name(name)))
            .ok_or_else(|| ConfigurationError::UnknownTemplate {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// The store command that applies `name` to `category`.
    pub fn apply_command(
        &self,
        category: Category,
        name: &str,
    ) -> Result<SettingsCommand, ConfigurationError> {
        let settings = self.get(category, name)?.clone();
        Ok(SettingsCommand::ApplyTemplate {
            name: normalize_name(name),
            settings,
        })
    }

    fn insert(&mut self, category: Category, name: &str, settings: CategoryValue) {
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return;
        }
        self.templates.insert((category, normalized), settings);
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn builtin_patches() -> Vec<(&'static str, CategoryPatch)> {
    vec![
        (
            "high-contrast",
            CategoryPatch::Line(LinePartial {
                color: Some(Color::from("#FFFF00")),
                line_width: Some(2.0),
                ..Default::default()
            }),
        ),
        (
            "print",
            CategoryPatch::Line(LinePartial {
                color: Some(Color::from("#000000")),
                line_width: Some(0.5),
                ..Default::default()
            }),
        ),
        (
            "high-contrast",
            CategoryPatch::Text(TextPartial {
                color: Some(Color::from("#FFFF00")),
                bold: Some(true),
                ..Default::default()
            }),
        ),
        (
            "print",
            CategoryPatch::Text(TextPartial {
                color: Some(Color::from("#000000")),
                font_family: Some("Times New Roman".to_string()),
                ..Default::default()
            }),
        ),
        (
            "large",
            CategoryPatch::Grip(GripPartial {
                size: Some(14.0),
                ..Default::default()
            }),
        ),
        (
            "blueprint",
            CategoryPatch::Grid(GridPartial {
                color: Some(Color::from("#2F5D8A")),
                major_color: Some(Color::from("#6FA8DC")),
                opacity: Some(0.8),
                ..Default::default()
            }),
        ),
        (
            "dots",
            CategoryPatch::Grid(GridPartial {
                style: Some(GridStyle::Dots),
                ..Default::default()
            }),
        ),
        (
            "light",
            CategoryPatch::Ruler(RulerPartial {
                background_color: Some(Color::from("#F0F0F0")),
                text_color: Some(Color::from("#202020")),
                tick_color: Some(Color::from("#606060")),
                ..Default::default()
            }),
        ),
        (
            "full-screen",
            CategoryPatch::Cursor(CursorPartial {
                crosshair_size: Some(100.0),
                shape: Some(CursorShape::Both),
                ..Default::default()
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GridSettings, SettingsRecord};
    use crate::store::SettingsStore;

    #[test]
    fn every_category_has_a_default_template() {
        let registry = TemplateRegistry::builtin();
        for category in Category::ALL {
            assert!(registry.names(category).contains(&DEFAULT_TEMPLATE));
        }
    }

    #[test]
    fn unknown_template_is_a_configuration_error() {
        let registry = TemplateRegistry::builtin();
        let err = registry.get(Category::Grid, "neon").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownTemplate {
                category: "grid".into(),
                name: "neon".into(),
            }
        );
    }

    #[test]
    fn switching_templates_keeps_only_the_new_general() {
        let registry = TemplateRegistry::builtin();
        let mut store = SettingsStore::new();

        store.apply(registry.apply_command(Category::Grid, "Blueprint").expect("template"));
        store.update_template_override::<GridSettings>(GridPartial {
            spacing: Some(20.0),
            ..Default::default()
        });
        store.apply(registry.apply_command(Category::Grid, "dots").expect("template"));

        let layers = store.layers::<GridSettings>();
        assert_eq!(layers.active_template(), Some("dots"));
        assert!(layers.template_override().spacing.is_none());
        assert_eq!(layers.general().style, GridStyle::Dots);
        assert_eq!(layers.general().color, GridSettings::factory().color);
    }

    #[test]
    fn registered_templates_shadow_builtins() {
        let mut registry = TemplateRegistry::builtin();
        let mut custom = GridSettings::factory();
        custom.spacing = 2.0;
        registry.register("Dots", CategoryValue::Grid(custom.clone()));
        assert_eq!(
            registry.get(Category::Grid, "dots").expect("template"),
            &CategoryValue::Grid(custom)
        );
    }
}
