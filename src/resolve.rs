//! Layer resolution: collapse a category's layers into effective settings.
//!
//! Precedence, lowest first: general, template override, the mode's specific
//! delta, the mode's user override (only while enabled). The specific layer is
//! applied whenever it exists; the enable flag gates the override layer alone.

use std::sync::Arc;

use crate::mode::{self, StorageMode, ViewerMode};
use crate::settings::{PartialSettings, SettingsRecord};
use crate::store::CategoryLayers;

/// Overwrite the fields set in `partial`.
///
/// Returns `base` itself (same allocation) when `partial` is empty so that
/// consumers comparing by pointer can skip recomputation.
pub fn merge<T: SettingsRecord>(base: Arc<T>, partial: &T::Partial) -> Arc<T> {
    if partial.is_empty() {
        return base;
    }
    let mut merged = T::clone(&base);
    merged.apply(partial);
    Arc::new(merged)
}

/// Effective settings for `mode`. Pure and synchronous.
pub fn compute_effective<T: SettingsRecord>(layers: &CategoryLayers<T>, mode: ViewerMode) -> Arc<T> {
    let mapped = mode::map(mode);
    let mut result = Arc::clone(layers.general());

    result = merge(result, layers.template_override());

    if mapped != StorageMode::Normal {
        if let Some(specific) = layers.specific(mapped) {
            result = merge(result, specific);
        }
    }

    if layers.is_override_enabled(mapped) {
        if let Some(user) = layers.override_for(mapped) {
            result = merge(result, user);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Color, GridPartial, GridSettings, LinePartial, LineSettings};

    #[test]
    fn empty_partial_keeps_the_same_allocation() {
        let base = Arc::new(LineSettings::factory());
        let merged = merge(Arc::clone(&base), &LinePartial::default());
        assert!(Arc::ptr_eq(&base, &merged));
    }

    #[test]
    fn merge_overwrites_only_set_fields() {
        let base = Arc::new(LineSettings::factory());
        let merged = merge(
            Arc::clone(&base),
            &LinePartial {
                opacity: Some(0.25),
                ..Default::default()
            },
        );
        assert_eq!(merged.opacity, 0.25);
        assert_eq!(merged.color, base.color);
        assert_eq!(merged.line_width, base.line_width);
    }

    #[test]
    fn normal_mode_without_layers_is_general_by_reference() {
        let layers = CategoryLayers::<GridSettings>::factory();
        let effective = compute_effective(&layers, ViewerMode::Normal);
        assert!(Arc::ptr_eq(&effective, layers.general()));
    }

    #[test]
    fn normal_mode_ignores_specific_entries() {
        let mut layers = CategoryLayers::<GridSettings>::factory();
        layers.update_specific(
            StorageMode::Normal,
            GridPartial {
                visible: Some(false),
                ..Default::default()
            },
        );
        assert!(compute_effective(&layers, ViewerMode::Normal).visible);
    }

    #[test]
    fn override_wins_over_specific_and_template_override() {
        let mut layers = CategoryLayers::<LineSettings>::factory();
        layers.update_template_override(LinePartial {
            color: Some(Color::from("#101010")),
            line_width: Some(3.0),
            ..Default::default()
        });
        layers.update_override(
            StorageMode::Hover,
            LinePartial {
                color: Some(Color::from("#00FF00")),
                ..Default::default()
            },
        );

        let hover = compute_effective(&layers, ViewerMode::Hover);
        assert_eq!(hover.color, Color::from("#FF8C00"), "override still disabled");
        assert_eq!(hover.line_width, 3.0);

        layers.set_override_enabled(StorageMode::Hover, true);
        let hover = compute_effective(&layers, ViewerMode::Hover);
        assert_eq!(hover.color, Color::from("#00FF00"));
        assert_eq!(hover.line_width, 3.0);

        let normal = compute_effective(&layers, ViewerMode::Normal);
        assert_eq!(normal.color, Color::from("#101010"));
    }

    #[test]
    fn toggling_an_override_off_and_on_restores_the_same_result() {
        let mut layers = CategoryLayers::<LineSettings>::factory();
        layers.set_override_enabled(StorageMode::Selection, true);
        layers.update_override(
            StorageMode::Selection,
            LinePartial {
                opacity: Some(0.4),
                line_width: Some(5.0),
                ..Default::default()
            },
        );
        let before = compute_effective(&layers, ViewerMode::Selection);
        assert_eq!(before.opacity, 0.4);

        layers.set_override_enabled(StorageMode::Selection, false);
        let disabled = compute_effective(&layers, ViewerMode::Selection);
        assert_eq!(disabled.opacity, LineSettings::factory().opacity);
        assert_eq!(
            layers
                .override_for(StorageMode::Selection)
                .and_then(|partial| partial.opacity),
            Some(0.4)
        );

        layers.set_override_enabled(StorageMode::Selection, true);
        assert_eq!(compute_effective(&layers, ViewerMode::Selection), before);
        assert_eq!(compute_effective(&layers, ViewerMode::Selection), before);
    }

    #[test]
    fn preview_resolves_like_draft() {
        let mut layers = CategoryLayers::<LineSettings>::factory();
        layers.update_override(
            StorageMode::Draft,
            LinePartial {
                line_width: Some(4.0),
                ..Default::default()
            },
        );
        layers.set_override_enabled(StorageMode::Draft, true);
        assert_eq!(
            compute_effective(&layers, ViewerMode::Preview),
            compute_effective(&layers, ViewerMode::Draft)
        );
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use crate::settings::LineType;
        use proptest::prelude::*;

        fn line_partial() -> impl Strategy<Value = LinePartial> {
            (
                proptest::option::of("#[0-9A-F]{6}"),
                proptest::option::of(0.1f32..20.0),
                proptest::option::of(0.0f32..1.0),
                proptest::option::of(prop_oneof![
                    Just(LineType::Solid),
                    Just(LineType::Dashed),
                    Just(LineType::Dotted),
                ]),
                proptest::option::of(any::<bool>()),
            )
                .prop_map(|(color, line_width, opacity, line_type, enabled)| LinePartial {
                    color: color.map(Color::from),
                    line_width,
                    opacity,
                    line_type,
                    enabled,
                    ..Default::default()
                })
        }

        fn viewer_mode() -> impl Strategy<Value = ViewerMode> {
            proptest::sample::select(ViewerMode::ALL.to_vec())
        }

        fn storage_mode() -> impl Strategy<Value = StorageMode> {
            proptest::sample::select(StorageMode::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn resolution_is_deterministic_and_alias_transparent(
                general in line_partial(),
                specific in line_partial(),
                user in line_partial(),
                layer_mode in storage_mode(),
                enabled in any::<bool>(),
                mode in viewer_mode(),
            ) {
                let mut layers = CategoryLayers::<LineSettings>::factory();
                layers.update_general(general);
                layers.update_specific(layer_mode, specific);
                layers.update_override(layer_mode, user);
                layers.set_override_enabled(layer_mode, enabled);

                prop_assert_eq!(
                    compute_effective(&layers, mode),
                    compute_effective(&layers, mode)
                );
                prop_assert_eq!(
                    compute_effective(&layers, ViewerMode::Preview),
                    compute_effective(&layers, ViewerMode::Draft)
                );
            }

            #[test]
            fn toggling_an_override_is_lossless(
                user in line_partial(),
                mode in storage_mode(),
            ) {
                let mut layers = CategoryLayers::<LineSettings>::factory();
                layers.update_override(mode, user);
                layers.set_override_enabled(mode, true);
                let before = compute_effective(&layers, ViewerMode::from(mode));

                layers.set_override_enabled(mode, false);
                layers.set_override_enabled(mode, true);
                prop_assert_eq!(compute_effective(&layers, ViewerMode::from(mode)), before);
            }
        }
    }
}
