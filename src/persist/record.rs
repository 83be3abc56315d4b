//! Versioned on-disk record format for one category.
//!
//! A record is a flat JSON object: the general layer's fields at the top
//! level, followed by the stamp fields and the nested mode layers:
//!
//! ```json
//! { "color": "#FFFFFF", "lineWidth": 1.0, ...,
//!   "schemaVersion": "2", "savedAtEpochMs": 1700000000000,
//!   "layers": { "specific": {...}, "overrides": {...}, "overrideEnabled": {...},
//!               "templateOverride": {...}, "activeTemplateName": null, "revision": 3 } }
//! ```
//!
//! Decoding is fail-soft: a record written by a different schema version is
//! discarded in favor of factory defaults, and individual fields that do not
//! parse are dropped.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StorageError;
use crate::mode::StorageMode;
use crate::settings::{each_category, Category, PartialSettings, SettingsRecord};
use crate::store::{CategoryLayers, CategoryState};

/// Schema version stamped into every record this build writes.
pub const SCHEMA_VERSION: &str = "2";

const KEY_PREFIX: &str = "stylestack/";

const FIELD_SCHEMA_VERSION: &str = "schemaVersion";
const FIELD_SAVED_AT: &str = "savedAtEpochMs";
const FIELD_SOURCE_KEY: &str = "sourceKey";
const FIELD_LAYERS: &str = "layers";

/// Storage key for a category's record.
pub fn record_key(category: Category) -> String {
    format!("{KEY_PREFIX}{}", category.key())
}

/// True when `raw` is a JSON object stamped with [`SCHEMA_VERSION`].
pub fn is_current_schema(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .get(FIELD_SCHEMA_VERSION)
                .and_then(Value::as_str)
                .map(|version| version == SCHEMA_VERSION)
        })
        .unwrap_or(false)
}

/// How a category's state was obtained at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No record existed; factory defaults are in use.
    Defaults,
    Loaded,
    /// A record with another schema version was ignored.
    StaleDiscarded { found: Option<String> },
    /// The record could not be parsed at all.
    Corrupt(String),
    /// The driver failed to read the key.
    Unreadable(String),
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::Loaded => write!(f, "loaded"),
            Self::StaleDiscarded { found: Some(version) } => {
                write!(f, "discarded (schema {version}, expected {SCHEMA_VERSION})")
            }
            Self::StaleDiscarded { found: None } => write!(f, "discarded (no schema version)"),
            Self::Corrupt(msg) => write!(f, "corrupt ({msg})"),
            Self::Unreadable(msg) => write!(f, "unreadable ({msg})"),
        }
    }
}

/// Decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T: SettingsRecord> {
    pub layers: CategoryLayers<T>,
    pub status: LoadStatus,
    pub source_key: Option<String>,
}

/// Serialize a category's layers into a record stamped with the current
/// schema version.
pub fn encode<T: SettingsRecord>(
    layers: &CategoryLayers<T>,
    source_key: Option<&str>,
    saved_at_millis: u64,
) -> Result<String, StorageError> {
    let mut record = match serde_json::to_value(layers.general.as_ref())? {
        Value::Object(fields) => fields,
        other => {
            return Err(StorageError::Unavailable(format!(
                "{} settings did not serialize to an object: {other}",
                T::CATEGORY
            )))
        }
    };
    record.insert(FIELD_SCHEMA_VERSION.into(), Value::from(SCHEMA_VERSION));
    record.insert(FIELD_SAVED_AT.into(), Value::from(saved_at_millis));
    if let Some(source_key) = source_key {
        record.insert(FIELD_SOURCE_KEY.into(), Value::from(source_key));
    }

    let mut nested = Map::new();
    nested.insert("specific".into(), encode_mode_map(&layers.specific)?);
    nested.insert("overrides".into(), encode_mode_map(&layers.overrides)?);
    nested.insert(
        "overrideEnabled".into(),
        Value::Object(
            layers
                .override_enabled
                .iter()
                .map(|(mode, enabled)| (mode.key().to_string(), Value::Bool(*enabled)))
                .collect(),
        ),
    );
    nested.insert(
        "templateOverride".into(),
        serde_json::to_value(&layers.template_override)?,
    );
    nested.insert(
        "activeTemplateName".into(),
        layers
            .active_template
            .as_deref()
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    nested.insert("revision".into(), Value::from(layers.revision));
    record.insert(FIELD_LAYERS.into(), Value::Object(nested));

    Ok(serde_json::to_string(&Value::Object(record))?)
}

/// Category-erased [`encode`].
pub fn encode_state(
    state: &CategoryState,
    source_key: Option<&str>,
    saved_at_millis: u64,
) -> Result<String, StorageError> {
    each_category!(state.category(), |T| match T::downcast_state(state) {
        Some(layers) => encode(layers, source_key, saved_at_millis),
        None => Err(StorageError::Unavailable(format!(
            "state does not belong to {}",
            state.category()
        ))),
    })
}

/// Parse a stored record. Never fails; problems show up in the status.
pub fn decode<T: SettingsRecord>(raw: Option<&str>) -> Decoded<T> {
    let Some(raw) = raw else {
        return defaults(LoadStatus::Defaults);
    };
    let fields = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return defaults(LoadStatus::Corrupt("record is not a JSON object".into())),
        Err(e) => return defaults(LoadStatus::Corrupt(e.to_string())),
    };

    let version = fields
        .get(FIELD_SCHEMA_VERSION)
        .and_then(Value::as_str)
        .map(str::to_string);
    if version.as_deref() != Some(SCHEMA_VERSION) {
        return defaults(LoadStatus::StaleDiscarded { found: version });
    }

    let source_key = fields
        .get(FIELD_SOURCE_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);
    let nested = fields
        .get(FIELD_LAYERS)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut layers = layers_from_general::<T>(Value::Object(fields));

    if let Some(specific) = nested.get("specific") {
        layers.specific = decode_mode_map::<T>(specific);
    }
    if let Some(overrides) = nested.get("overrides") {
        layers.overrides = decode_mode_map::<T>(overrides);
    }
    if let Some(Value::Object(flags)) = nested.get("overrideEnabled") {
        layers.override_enabled = flags
            .iter()
            .filter_map(|(mode, enabled)| Some((mode.parse::<StorageMode>().ok()?, enabled.as_bool()?)))
            .collect();
    }
    if let Some(template_override) = nested.get("templateOverride") {
        layers.template_override = decode_partial::<T>(template_override).unwrap_or_default();
    }
    layers.active_template = nested
        .get("activeTemplateName")
        .and_then(Value::as_str)
        .map(str::to_string);
    layers.revision = nested.get("revision").and_then(Value::as_u64).unwrap_or(0);

    Decoded {
        layers,
        status: LoadStatus::Loaded,
        source_key,
    }
}

/// Category-erased [`decode`].
pub fn decode_state(category: Category, raw: Option<&str>) -> (CategoryState, LoadStatus) {
    each_category!(category, |T| {
        let decoded = decode::<T>(raw);
        (T::wrap_state(decoded.layers), decoded.status)
    })
}

/// Build factory layers whose general record takes every valid field of
/// `payload`. Unknown fields are ignored.
pub fn layers_from_general<T: SettingsRecord>(payload: Value) -> CategoryLayers<T> {
    let mut layers = CategoryLayers::<T>::factory();
    if let Some(partial) = decode_partial::<T>(&payload) {
        let mut general = T::factory();
        general.apply(&partial);
        layers.general = Arc::new(general);
    }
    layers
}

fn defaults<T: SettingsRecord>(status: LoadStatus) -> Decoded<T> {
    Decoded {
        layers: CategoryLayers::factory(),
        status,
        source_key: None,
    }
}

fn decode_partial<T: SettingsRecord>(value: &Value) -> Option<T::Partial> {
    let mut partial: T::Partial = lenient_value(value)?;
    T::sanitize(&mut partial);
    Some(partial)
}

fn lenient_value<V: DeserializeOwned>(value: &Value) -> Option<V> {
    serde_json::from_value(value.clone()).ok()
}

fn encode_mode_map<P: PartialSettings>(
    entries: &BTreeMap<StorageMode, P>,
) -> Result<Value, StorageError> {
    let mut out = Map::new();
    for (mode, partial) in entries {
        out.insert(mode.key().to_string(), serde_json::to_value(partial)?);
    }
    Ok(Value::Object(out))
}

fn decode_mode_map<T: SettingsRecord>(value: &Value) -> BTreeMap<StorageMode, T::Partial> {
    let Some(entries) = value.as_object() else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(mode, partial)| {
            let mode = mode.parse::<StorageMode>().ok()?;
            let partial = decode_partial::<T>(partial)?;
            (!partial.is_empty()).then_some((mode, partial))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Color, GridSettings, LinePartial, LineSettings};

    fn customized_line() -> CategoryLayers<LineSettings> {
        let mut layers = CategoryLayers::<LineSettings>::factory();
        layers.update_general(LinePartial {
            line_width: Some(3.0),
            ..Default::default()
        });
        layers.update_override(
            StorageMode::Hover,
            LinePartial {
                opacity: Some(0.5),
                ..Default::default()
            },
        );
        layers.set_override_enabled(StorageMode::Hover, true);
        layers.apply_template("print", LineSettings::factory());
        layers.update_template_override(LinePartial {
            enabled: Some(false),
            ..Default::default()
        });
        layers.bump_revision();
        layers
    }

    #[test]
    fn record_key_uses_category_key() {
        assert_eq!(record_key(Category::Cursor), "stylestack/cursor");
    }

    #[test]
    fn encoded_record_restores_every_layer() {
        let layers = customized_line();
        let raw = encode(&layers, None, 42).expect("encode");
        let decoded = decode::<LineSettings>(Some(&raw));
        assert_eq!(decoded.status, LoadStatus::Loaded);
        assert_eq!(decoded.layers, layers);
        assert_eq!(decoded.source_key, None);
    }

    #[test]
    fn record_keeps_general_fields_at_top_level() {
        let raw = encode(&CategoryLayers::<LineSettings>::factory(), Some("old"), 7)
            .expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["color"], "#FFFFFF");
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["savedAtEpochMs"], 7);
        assert_eq!(value["sourceKey"], "old");
        assert!(value["layers"]["specific"]["hover"].is_object());
    }

    #[test]
    fn absent_record_yields_defaults() {
        let decoded = decode::<GridSettings>(None);
        assert_eq!(decoded.status, LoadStatus::Defaults);
        assert_eq!(decoded.layers, CategoryLayers::factory());
    }

    #[test]
    fn other_schema_versions_are_discarded() {
        let raw = r#"{"lineWidth": 9.0, "schemaVersion": "1"}"#;
        let decoded = decode::<LineSettings>(Some(raw));
        assert_eq!(
            decoded.status,
            LoadStatus::StaleDiscarded {
                found: Some("1".into())
            }
        );
        assert_eq!(decoded.layers.general().line_width, 1.0);

        let unversioned = decode::<LineSettings>(Some(r#"{"lineWidth": 9.0}"#));
        assert_eq!(unversioned.status, LoadStatus::StaleDiscarded { found: None });
    }

    #[test]
    fn unparsable_record_is_reported_as_corrupt() {
        let decoded = decode::<LineSettings>(Some("{not json"));
        assert!(matches!(decoded.status, LoadStatus::Corrupt(_)));
        assert_eq!(decoded.layers, CategoryLayers::factory());
    }

    #[test]
    fn current_record_merges_onto_factory_defaults() {
        let raw = r##"{"color":"#abc","lineWidth":"thick","futureField":true,"schemaVersion":"2"}"##;
        let decoded = decode::<LineSettings>(Some(raw));
        assert_eq!(decoded.status, LoadStatus::Loaded);
        let general = decoded.layers.general();
        assert_eq!(general.color, Color::from("#AABBCC"));
        assert_eq!(general.line_width, LineSettings::factory().line_width);
        assert_eq!(decoded.layers.specific, CategoryLayers::<LineSettings>::factory().specific);
    }

    #[test]
    fn state_helpers_dispatch_by_category() {
        let state = CategoryState::Line(customized_line());
        let raw = encode_state(&state, None, 1).expect("encode");
        let (restored, status) = decode_state(Category::Line, Some(&raw));
        assert_eq!(status, LoadStatus::Loaded);
        assert_eq!(restored, state);
    }
}
