//! Record model shared by adapters, corpora and the comparison engine.
//!
//! A [`ParsedRecord`] always has the same four sections with a fixed field
//! set. Fields an adapter or corpus does not assert deserialize as
//! [`FieldValue::Null`], so lookups never have to distinguish "omitted" from
//! "unknown".

pub mod loaders;
pub mod schemas;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One of the four top-level sections of a parsed record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldGroup {
    Client,
    Engine,
    Platform,
    Device,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 4] = [
        FieldGroup::Client,
        FieldGroup::Engine,
        FieldGroup::Platform,
        FieldGroup::Device,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Client => "client",
            FieldGroup::Engine => "engine",
            FieldGroup::Platform => "platform",
            FieldGroup::Device => "device",
        }
    }

    /// Field names of this section, in display order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            FieldGroup::Client => &["name", "version", "isBot", "type"],
            FieldGroup::Engine => &["name", "version"],
            FieldGroup::Platform => &["name", "version"],
            FieldGroup::Device => &["name", "brand", "type", "ismobile", "istouch"],
        }
    }

    pub fn parse(name: &str) -> Option<FieldGroup> {
        FieldGroup::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw field value as an adapter or corpus reported it.
///
/// Numbers, arrays and objects are kept as [`FieldValue::Unsupported`] so the
/// comparison engine can skip them explicitly instead of coercing them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Text(String),
    Unsupported(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// True for values that can be normalized: strings, booleans and null.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::Unsupported(_))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Unsupported(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Unsupported(v) => v,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClientInfo {
    pub name: FieldValue,
    pub version: FieldValue,
    #[serde(rename = "isBot")]
    pub is_bot: FieldValue,
    #[serde(rename = "type")]
    pub kind: FieldValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineInfo {
    pub name: FieldValue,
    pub version: FieldValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PlatformInfo {
    pub name: FieldValue,
    pub version: FieldValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DeviceInfo {
    pub name: FieldValue,
    pub brand: FieldValue,
    #[serde(rename = "type")]
    pub kind: FieldValue,
    pub ismobile: FieldValue,
    pub istouch: FieldValue,
}

/// Parser output (or expectation) normalized to the common envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ParsedRecord {
    pub client: ClientInfo,
    pub engine: EngineInfo,
    pub platform: PlatformInfo,
    pub device: DeviceInfo,
}

impl ParsedRecord {
    /// Fields of one section as `(name, value)` pairs in display order.
    pub fn section(&self, group: FieldGroup) -> Vec<(&'static str, &FieldValue)> {
        match group {
            FieldGroup::Client => vec![
                ("name", &self.client.name),
                ("version", &self.client.version),
                ("isBot", &self.client.is_bot),
                ("type", &self.client.kind),
            ],
            FieldGroup::Engine => vec![
                ("name", &self.engine.name),
                ("version", &self.engine.version),
            ],
            FieldGroup::Platform => vec![
                ("name", &self.platform.name),
                ("version", &self.platform.version),
            ],
            FieldGroup::Device => vec![
                ("name", &self.device.name),
                ("brand", &self.device.brand),
                ("type", &self.device.kind),
                ("ismobile", &self.device.ismobile),
                ("istouch", &self.device.istouch),
            ],
        }
    }

    /// Looks up a single field; unknown field names read as null.
    pub fn field(&self, group: FieldGroup, name: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.section(group)
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
            .unwrap_or(&NULL)
    }
}
