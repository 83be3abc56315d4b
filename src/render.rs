//! Terminal output for the `stylestack` binary.
//!
//! Data (effective settings, template names) goes to stdout so it can be piped;
//! status lines go to stderr.

use crossterm::style::{Color as TermColor, Stylize};
use serde_json::Value;

use crate::settings::Color;

const INDENT: &str = "  ";
const SWATCH: &str = "██";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Section header on stdout.
    pub fn section(&self, title: &str) {
        if self.color {
            println!("{} {}", "•".with(TermColor::DarkGrey), title.bold());
        } else {
            println!("{title}:");
        }
    }

    /// One `key: value` row on stdout. Hex colors get a swatch.
    pub fn field(&self, key: &str, value: &Value) {
        let text = display_value(value);
        if !self.color {
            println!("{INDENT}{key}: {text}");
            return;
        }
        let key = format!("{key}:").with(TermColor::Cyan);
        match swatch_rgb(value) {
            Some((r, g, b)) => println!(
                "{INDENT}{key} {} {text}",
                SWATCH.with(TermColor::Rgb { r, g, b })
            ),
            None => println!("{INDENT}{key} {text}"),
        }
    }

    /// Plain indented line on stdout.
    pub fn detail(&self, text: &str) {
        println!("{INDENT}{text}");
    }

    /// Status line on stderr.
    pub fn activity(&self, text: &str) {
        if self.color {
            eprintln!("{}", text.with(TermColor::DarkGrey).bold());
        } else {
            eprintln!("{text}");
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.with(TermColor::Yellow).bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    pub fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.with(TermColor::Red).bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }

    /// Print every field of a JSON object in key order.
    pub fn record(&self, title: &str, record: &Value) {
        self.section(title);
        match record.as_object() {
            Some(fields) => {
                for (key, value) in fields {
                    self.field(key, value);
                }
            }
            None => self.detail(&display_value(record)),
        }
    }
}

/// Strings without quotes, everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn swatch_rgb(value: &Value) -> Option<(u8, u8, u8)> {
    let text = value.as_str()?;
    if !text.starts_with('#') {
        return None;
    }
    Color::from(text).to_rgb()
}
