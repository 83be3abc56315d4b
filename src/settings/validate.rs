//! Field validation: clamp numerics, normalize colors, substitute the rest.
//!
//! Nothing here rejects a write. An out-of-range number is clamped into range;
//! a value that cannot be repaired (NaN, malformed color, blank font family) is
//! replaced with the factory value of the same field. Unset fields stay unset.

use tracing::debug;

use super::*;

fn clamp_f32(
    category: Category,
    field: &'static str,
    value: &mut Option<f32>,
    min: f32,
    max: f32,
    fallback: f32,
) {
    let Some(current) = *value else {
        return;
    };
    let repaired = if current.is_nan() {
        fallback
    } else {
        current.clamp(min, max)
    };
    if repaired != current {
        debug!(%category, field, from = current, to = repaired, "clamped settings value");
        *value = Some(repaired);
    }
}

fn clamp_u32(
    category: Category,
    field: &'static str,
    value: &mut Option<u32>,
    min: u32,
    max: u32,
) {
    let Some(current) = *value else {
        return;
    };
    let repaired = current.clamp(min, max);
    if repaired != current {
        debug!(%category, field, from = current, to = repaired, "clamped settings value");
        *value = Some(repaired);
    }
}

fn normalize_color(
    category: Category,
    field: &'static str,
    value: &mut Option<Color>,
    fallback: &Color,
) {
    let Some(current) = value.as_ref() else {
        return;
    };
    match current.normalized() {
        Some(normalized) => *value = Some(normalized),
        None => {
            debug!(%category, field, from = %current, to = %fallback, "substituted malformed color");
            *value = Some(fallback.clone());
        }
    }
}

fn non_blank(category: Category, field: &'static str, value: &mut Option<String>, fallback: &str) {
    let Some(current) = value.as_ref() else {
        return;
    };
    let trimmed = current.trim();
    if trimmed.is_empty() {
        debug!(%category, field, to = fallback, "substituted blank text value");
        *value = Some(fallback.to_string());
    } else if trimmed.len() != current.len() {
        *value = Some(trimmed.to_string());
    }
}

fn unit_interval(category: Category, field: &'static str, value: &mut Option<f32>, fallback: f32) {
    clamp_f32(category, field, value, 0.0, 1.0, fallback);
}

impl LineSettings {
    pub(crate) fn sanitize_fields(p: &mut LinePartial) {
        let f = Self::factory_defaults();
        let c = Category::Line;
        normalize_color(c, "color", &mut p.color, &f.color);
        clamp_f32(c, "line_width", &mut p.line_width, 0.1, 20.0, f.line_width);
        unit_interval(c, "opacity", &mut p.opacity, f.opacity);
        clamp_f32(c, "dash_scale", &mut p.dash_scale, 0.1, 10.0, f.dash_scale);
    }
}

impl TextSettings {
    pub(crate) fn sanitize_fields(p: &mut TextPartial) {
        let f = Self::factory_defaults();
        let c = Category::Text;
        normalize_color(c, "color", &mut p.color, &f.color);
        non_blank(c, "font_family", &mut p.font_family, &f.font_family);
        clamp_f32(c, "font_size", &mut p.font_size, 4.0, 200.0, f.font_size);
        unit_interval(c, "opacity", &mut p.opacity, f.opacity);
    }
}

impl GripSettings {
    pub(crate) fn sanitize_fields(p: &mut GripPartial) {
        let f = Self::factory_defaults();
        let c = Category::Grip;
        normalize_color(c, "color", &mut p.color, &f.color);
        normalize_color(c, "outline_color", &mut p.outline_color, &f.outline_color);
        clamp_f32(c, "size", &mut p.size, 2.0, 32.0, f.size);
        unit_interval(c, "opacity", &mut p.opacity, f.opacity);
    }
}

impl GridSettings {
    pub(crate) fn sanitize_fields(p: &mut GridPartial) {
        let f = Self::factory_defaults();
        let c = Category::Grid;
        normalize_color(c, "color", &mut p.color, &f.color);
        normalize_color(c, "major_color", &mut p.major_color, &f.major_color);
        clamp_f32(c, "spacing", &mut p.spacing, 1.0, 1000.0, f.spacing);
        clamp_u32(c, "major_every", &mut p.major_every, 1, 100);
        unit_interval(c, "opacity", &mut p.opacity, f.opacity);
    }
}

impl RulerSettings {
    pub(crate) fn sanitize_fields(p: &mut RulerPartial) {
        let f = Self::factory_defaults();
        let c = Category::Ruler;
        normalize_color(c, "background_color", &mut p.background_color, &f.background_color);
        normalize_color(c, "text_color", &mut p.text_color, &f.text_color);
        normalize_color(c, "tick_color", &mut p.tick_color, &f.tick_color);
        clamp_f32(c, "height", &mut p.height, 10.0, 80.0, f.height);
        clamp_f32(c, "font_size", &mut p.font_size, 6.0, 24.0, f.font_size);
    }
}

impl CursorSettings {
    pub(crate) fn sanitize_fields(p: &mut CursorPartial) {
        let f = Self::factory_defaults();
        let c = Category::Cursor;
        normalize_color(c, "color", &mut p.color, &f.color);
        clamp_f32(c, "crosshair_size", &mut p.crosshair_size, 1.0, 100.0, f.crosshair_size);
        clamp_f32(c, "line_width", &mut p.line_width, 0.5, 5.0, f.line_width);
        unit_interval(c, "opacity", &mut p.opacity, f.opacity);
        clamp_f32(c, "pickbox_size", &mut p.pickbox_size, 2.0, 50.0, f.pickbox_size);
    }
}
