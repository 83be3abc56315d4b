//! Record and partial definitions for each category.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::{
    Category, CategoryPatch, CategoryValue, Color, EffectiveSettings, PartialSettings,
    SettingsRecord,
};
use crate::error::ConfigurationError;
use crate::mode::StorageMode;
use crate::store::{CategoryLayers, CategoryState, SettingsStore};

/// Deserialize an optional field, turning a malformed value into "not set".
///
/// Persisted records outlive the code that wrote them; one bad field must not
/// take the rest of the record down with it.
fn lenient<'de, D, V>(deserializer: D) -> Result<Option<V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

macro_rules! settings_record {
    (
        $(#[$meta:meta])*
        $variant:ident => $name:ident / $partial:ident in $store_field:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        #[doc = concat!("Sparse patch over [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $partial {
            $(
                #[serde(
                    default,
                    skip_serializing_if = "Option::is_none",
                    deserialize_with = "lenient"
                )]
                pub $field: Option<$ty>,
            )+
        }

        impl PartialSettings for $partial {
            fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )+
            }

            fn merge_from(&mut self, other: &Self) {
                $(
                    if let Some(value) = &other.$field {
                        self.$field = Some(value.clone());
                    }
                )+
            }

            fn present_fields(&self) -> Vec<&'static str> {
                let mut fields = Vec::new();
                $(
                    if self.$field.is_some() {
                        fields.push(stringify!($field));
                    }
                )+
                fields
            }
        }

        impl SettingsRecord for $name {
            type Partial = $partial;

            const CATEGORY: Category = Category::$variant;

            fn factory() -> Self {
                Self::factory_defaults()
            }

            fn apply(&mut self, partial: &$partial) {
                $(
                    if let Some(value) = &partial.$field {
                        self.$field = value.clone();
                    }
                )+
            }

            fn to_partial(&self) -> $partial {
                $partial {
                    $( $field: Some(self.$field.clone()), )+
                }
            }

            fn sanitize(partial: &mut $partial) {
                Self::sanitize_fields(partial);
            }

            fn builtin_specific() -> Vec<(StorageMode, $partial)> {
                Self::presentation_deltas()
            }

            fn wrap(value: Arc<Self>) -> EffectiveSettings {
                EffectiveSettings::$variant(value)
            }

            fn wrap_patch(partial: $partial) -> CategoryPatch {
                CategoryPatch::$variant(partial)
            }

            fn wrap_value(value: Self) -> CategoryValue {
                CategoryValue::$variant(value)
            }

            fn downcast_patch(patch: &CategoryPatch) -> Option<&$partial> {
                match patch {
                    CategoryPatch::$variant(partial) => Some(partial),
                    _ => None,
                }
            }

            fn downcast_value(value: CategoryValue) -> Result<Self, ConfigurationError> {
                match value {
                    CategoryValue::$variant(record) => Ok(record),
                    other => Err(ConfigurationError::CategoryMismatch {
                        expected: Category::$variant.to_string(),
                        found: other.category().to_string(),
                    }),
                }
            }

            fn downcast_effective(value: &EffectiveSettings) -> Option<&Arc<Self>> {
                match value {
                    EffectiveSettings::$variant(record) => Some(record),
                    _ => None,
                }
            }

            fn wrap_state(layers: CategoryLayers<Self>) -> CategoryState {
                CategoryState::$variant(layers)
            }

            fn downcast_state(state: &CategoryState) -> Option<&CategoryLayers<Self>> {
                match state {
                    CategoryState::$variant(layers) => Some(layers),
                    _ => None,
                }
            }

            fn layers(store: &SettingsStore) -> &CategoryLayers<Self> {
                &store.$store_field
            }

            fn layers_mut(store: &mut SettingsStore) -> &mut CategoryLayers<Self> {
                &mut store.$store_field
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Closed enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineType {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GripShape {
    #[default]
    Square,
    Circle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    #[default]
    Lines,
    Dots,
    Crosses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RulerUnit {
    #[default]
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "in")]
    Inches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorShape {
    #[default]
    Crosshair,
    Pickbox,
    Both,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

settings_record! {
    /// Stroke styling for drawn entities.
    Line => LineSettings / LinePartial in line {
        color: Color,
        /// Stroke width in pixels (0.1 to 20).
        line_width: f32,
        opacity: f32,
        line_type: LineType,
        /// Multiplier for dash and gap lengths (0.1 to 10).
        dash_scale: f32,
        line_cap: LineCap,
        enabled: bool,
    }
}

settings_record! {
    /// Annotation and label text.
    Text => TextSettings / TextPartial in text {
        color: Color,
        font_family: String,
        /// Point size (4 to 200).
        font_size: f32,
        opacity: f32,
        bold: bool,
        italic: bool,
        alignment: TextAlign,
    }
}

settings_record! {
    /// Editing handles drawn on selected entities.
    Grip => GripSettings / GripPartial in grip {
        color: Color,
        outline_color: Color,
        /// Handle edge length in pixels (2 to 32).
        size: f32,
        opacity: f32,
        shape: GripShape,
        show_midpoints: bool,
    }
}

settings_record! {
    /// Background drawing grid.
    Grid => GridSettings / GridPartial in grid {
        color: Color,
        major_color: Color,
        /// Minor spacing in drawing units (1 to 1000).
        spacing: f32,
        /// Minor lines per major line (1 to 100).
        major_every: u32,
        opacity: f32,
        style: GridStyle,
        visible: bool,
    }
}

settings_record! {
    /// Edge rulers.
    Ruler => RulerSettings / RulerPartial in ruler {
        background_color: Color,
        text_color: Color,
        tick_color: Color,
        /// Ruler thickness in pixels (10 to 80).
        height: f32,
        font_size: f32,
        unit: RulerUnit,
        visible: bool,
    }
}

settings_record! {
    /// Crosshair and pickbox cursor.
    Cursor => CursorSettings / CursorPartial in cursor {
        color: Color,
        /// Crosshair arm length as a percentage of the viewport (1 to 100).
        crosshair_size: f32,
        line_width: f32,
        opacity: f32,
        pickbox_size: f32,
        shape: CursorShape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_serializes_only_set_fields() {
        let partial = LinePartial {
            opacity: Some(0.5),
            ..Default::default()
        };
        let value = serde_json::to_value(&partial).expect("serialize");
        assert_eq!(value, serde_json::json!({ "opacity": 0.5 }));
    }

    #[test]
    fn partial_drops_malformed_fields_and_keeps_the_rest() {
        let raw = r##"{"color":"#ff0000","lineType":"zigzag","lineWidth":"wide","opacity":0.25}"##;
        let partial: LinePartial = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(partial.color, Some(Color::from("#ff0000")));
        assert_eq!(partial.line_type, None);
        assert_eq!(partial.line_width, None);
        assert_eq!(partial.opacity, Some(0.25));
    }

    #[test]
    fn merge_from_only_touches_set_fields() {
        let mut base = GridPartial {
            spacing: Some(10.0),
            visible: Some(true),
            ..Default::default()
        };
        base.merge_from(&GridPartial {
            visible: Some(false),
            ..Default::default()
        });
        assert_eq!(base.spacing, Some(10.0));
        assert_eq!(base.visible, Some(false));
        assert_eq!(base.present_fields(), vec!["spacing", "visible"]);
    }

    #[test]
    fn downcast_value_rejects_other_categories() {
        let value = CategoryValue::Grid(GridSettings::factory());
        let err = LineSettings::downcast_value(value).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::CategoryMismatch {
                expected: "line".into(),
                found: "grid".into(),
            }
        );
    }

    #[test]
    fn ruler_units_use_short_names() {
        let raw = serde_json::to_string(&RulerUnit::Inches).expect("serialize");
        assert_eq!(raw, "\"in\"");
    }
}
