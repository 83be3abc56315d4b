//! Factory defaults and built-in per-mode presentation deltas.
//!
//! Keeping every literal here lets the store, templates and tests share one
//! definition of "factory".

use super::*;
use crate::mode::StorageMode;

/// Hover highlight shared by every category that has a color.
pub(crate) const HOVER_COLOR: &str = "#FF8C00";
/// Selection highlight.
pub(crate) const SELECTION_COLOR: &str = "#1E90FF";
/// Confirmation color shown once an entity is completed.
pub(crate) const COMPLETION_COLOR: &str = "#32CD32";
/// Draft (and preview) entities render at this opacity.
pub(crate) const DRAFT_OPACITY: f32 = 0.6;

pub(crate) const DEFAULT_FONT_FAMILY: &str = "Arial";

fn color(hex: &str) -> Color {
    Color::from(hex)
}

impl LineSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            color: color("#FFFFFF"),
            line_width: 1.0,
            opacity: 1.0,
            line_type: LineType::Solid,
            dash_scale: 1.0,
            line_cap: LineCap::Butt,
            enabled: true,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, LinePartial)> {
        vec![
            (
                StorageMode::Draft,
                LinePartial {
                    opacity: Some(DRAFT_OPACITY),
                    line_type: Some(LineType::Dashed),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Hover,
                LinePartial {
                    color: Some(color(HOVER_COLOR)),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Selection,
                LinePartial {
                    color: Some(color(SELECTION_COLOR)),
                    line_width: Some(2.0),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Completion,
                LinePartial {
                    color: Some(color(COMPLETION_COLOR)),
                    ..Default::default()
                },
            ),
        ]
    }
}

impl TextSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            color: color("#FFFFFF"),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: 12.0,
            opacity: 1.0,
            bold: false,
            italic: false,
            alignment: TextAlign::Left,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, TextPartial)> {
        vec![
            (
                StorageMode::Draft,
                TextPartial {
                    opacity: Some(DRAFT_OPACITY),
                    italic: Some(true),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Hover,
                TextPartial {
                    color: Some(color(HOVER_COLOR)),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Selection,
                TextPartial {
                    color: Some(color(SELECTION_COLOR)),
                    bold: Some(true),
                    ..Default::default()
                },
            ),
        ]
    }
}

impl GripSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            color: color("#0000FF"),
            outline_color: color("#FFFFFF"),
            size: 8.0,
            opacity: 1.0,
            shape: GripShape::Square,
            show_midpoints: true,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, GripPartial)> {
        vec![
            (
                StorageMode::Hover,
                GripPartial {
                    color: Some(color(HOVER_COLOR)),
                    size: Some(10.0),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Selection,
                GripPartial {
                    color: Some(color("#FF0000")),
                    ..Default::default()
                },
            ),
        ]
    }
}

impl GridSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            color: color("#3A3A3A"),
            major_color: color("#5A5A5A"),
            spacing: 10.0,
            major_every: 5,
            opacity: 0.6,
            style: GridStyle::Lines,
            visible: true,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, GridPartial)> {
        vec![(
            StorageMode::Draft,
            GridPartial {
                opacity: Some(0.4),
                ..Default::default()
            },
        )]
    }
}

impl RulerSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            background_color: color("#1E1E1E"),
            text_color: color("#CCCCCC"),
            tick_color: color("#888888"),
            height: 24.0,
            font_size: 10.0,
            unit: RulerUnit::Millimeters,
            visible: true,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, RulerPartial)> {
        vec![(
            StorageMode::Hover,
            RulerPartial {
                tick_color: Some(color(HOVER_COLOR)),
                ..Default::default()
            },
        )]
    }
}

impl CursorSettings {
    pub(crate) fn factory_defaults() -> Self {
        Self {
            color: color("#FFFFFF"),
            crosshair_size: 5.0,
            line_width: 1.0,
            opacity: 1.0,
            pickbox_size: 10.0,
            shape: CursorShape::Crosshair,
        }
    }

    pub(crate) fn presentation_deltas() -> Vec<(StorageMode, CursorPartial)> {
        vec![
            (
                StorageMode::Draft,
                CursorPartial {
                    shape: Some(CursorShape::Both),
                    ..Default::default()
                },
            ),
            (
                StorageMode::Selection,
                CursorPartial {
                    shape: Some(CursorShape::Pickbox),
                    ..Default::default()
                },
            ),
        ]
    }
}
