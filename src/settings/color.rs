//! Hex color values.
//!
//! A `Color` may hold whatever text a caller supplied. Sanitizing a patch
//! replaces it with the normalized `#RRGGBB` / `#RRGGBBAA` form, or with a
//! fallback when the text is not a color at all, so stored layers only ever
//! contain normalized values.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Build a normalized color from RGB components.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form, or `None` when the text is not a hex color.
    ///
    /// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA`, with or without the `#`.
    pub fn normalized(&self) -> Option<Color> {
        let trimmed = self.0.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };
        Some(Self(format!("#{}", expanded.to_ascii_uppercase())))
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized().is_some_and(|normalized| normalized == *self)
    }

    /// RGB components, ignoring any alpha channel.
    pub fn to_rgb(&self) -> Option<(u8, u8, u8)> {
        let normalized = self.normalized()?;
        let hex = &normalized.0[1..];
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
        Some((channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
