//! Value normalization.
//!
//! Parsers disagree on capitalisation, punctuation, version granularity and
//! vocabulary. Every raw field value is reduced to a [`NormalizedValue`]
//! before it is compared or scored:
//!
//! - `null` stays [`NormalizedValue::Unknown`]
//! - `version` fields are lowercased, `_` becomes `.`, and only
//!   `major.minor` is kept
//! - booleans become the tokens `"true"` / `"false"`
//! - everything else is lowercased and stripped to `[0-9a-z]`
//! - Windows platform names get the platform version appended
//! - the [`SynonymMap`] gets the last word
//!
//! ```rust
//! use uabench::data::{FieldGroup, FieldValue};
//! use uabench::normalize::{NormalizedValue, Normalizer};
//!
//! let normalizer = Normalizer::default();
//! let value = normalizer.normalize(
//!     FieldGroup::Client,
//!     "name",
//!     &FieldValue::from("Internet Explorer"),
//!     &[],
//! );
//! assert_eq!(value, NormalizedValue::Value("internetexplorer".to_string()));
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, trace, warn};

use crate::data::{FieldGroup, FieldValue, ParsedRecord};
use crate::errors::{Result, UaBenchError};

/// Platform names some parsers fold into one value regardless of version.
const VERSIONED_PLATFORM_NAMES: [&str; 2] = ["windows", "windowsphone"];

/// Canonical, comparable form of one field value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormalizedValue {
    /// The parser or corpus asserted nothing.
    Unknown,
    /// A value was asserted but nothing survived normalization.
    Empty,
    Value(String),
}

impl NormalizedValue {
    pub fn from_token(token: String) -> Self {
        if token.is_empty() {
            NormalizedValue::Empty
        } else {
            NormalizedValue::Value(token)
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NormalizedValue::Unknown)
    }

    /// The raw token; `Some("")` for [`NormalizedValue::Empty`].
    pub fn token(&self) -> Option<&str> {
        match self {
            NormalizedValue::Unknown => None,
            NormalizedValue::Empty => Some(""),
            NormalizedValue::Value(v) => Some(v),
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Unknown => f.write_str("[n/a]"),
            NormalizedValue::Empty => f.write_str("[no value]"),
            NormalizedValue::Value(v) => f.write_str(v),
        }
    }
}

// Serialized as its display form so it can key JSON objects.
impl Serialize for NormalizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

type SynonymTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

/// `section → field → token → canonical token`, curated outside the code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymMap {
    entries: SynonymTable,
}

impl SynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a synonym map from JSON, or YAML when the extension says so.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| UaBenchError::synonyms(path, e.to_string()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let map = if is_yaml {
            Self::from_yaml_str(&content).map_err(|e| UaBenchError::synonyms(path, e.to_string()))?
        } else {
            Self::from_json_str(&content).map_err(|e| UaBenchError::synonyms(path, e.to_string()))?
        };

        info!("Loaded {} synonyms from {}", map.len(), path.display());
        map.warn_on_chains();
        Ok(map)
    }

    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn insert(&mut self, group: FieldGroup, field: &str, token: &str, canonical: &str) {
        self.entries
            .entry(group.as_str().to_string())
            .or_default()
            .entry(field.to_string())
            .or_default()
            .insert(token.to_string(), canonical.to_string());
    }

    pub fn lookup(&self, group: FieldGroup, field: &str, token: &str) -> Option<&str> {
        self.entries
            .get(group.as_str())
            .and_then(|fields| fields.get(field))
            .and_then(|tokens| tokens.get(token))
            .map(String::as_str)
    }

    /// Total number of token mappings.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(|fields| fields.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A canonical token that is itself a key breaks idempotence.
    fn warn_on_chains(&self) {
        for (section, fields) in &self.entries {
            for (field, tokens) in fields {
                for (token, canonical) in tokens {
                    if token != canonical && tokens.contains_key(canonical) {
                        warn!(
                            "Synonym chain in {}.{}: '{}' -> '{}' is itself mapped",
                            section, field, token, canonical
                        );
                    }
                }
            }
        }
    }
}

/// Normalized fields of one section. A field whose raw value was not a
/// scalar is absent.
pub type NormalizedSection = BTreeMap<&'static str, NormalizedValue>;

/// A [`ParsedRecord`] after normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    sections: BTreeMap<FieldGroup, NormalizedSection>,
}

impl NormalizedRecord {
    pub fn section(&self, group: FieldGroup) -> Option<&NormalizedSection> {
        self.sections.get(&group)
    }

    pub fn get(&self, group: FieldGroup, field: &str) -> Option<&NormalizedValue> {
        self.sections.get(&group).and_then(|s| s.get(field))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    synonyms: SynonymMap,
}

impl Normalizer {
    pub fn new(synonyms: SynonymMap) -> Self {
        Normalizer { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymMap {
        &self.synonyms
    }

    /// Swap in a new synonym map; later calls use it immediately.
    pub fn set_synonyms(&mut self, synonyms: SynonymMap) {
        self.synonyms = synonyms;
    }

    /// Normalize one raw value. `siblings` are the other raw fields of the
    /// same section; only the platform version is consulted. Non-scalar
    /// values read as unknown; [`Normalizer::normalize_record`] drops them
    /// before they get here.
    pub fn normalize(
        &self,
        group: FieldGroup,
        field: &str,
        raw: &FieldValue,
        siblings: &[(&str, &FieldValue)],
    ) -> NormalizedValue {
        let mut token = match raw {
            FieldValue::Null | FieldValue::Unsupported(_) => return NormalizedValue::Unknown,
            FieldValue::Bool(b) if field == "version" => version_token(&b.to_string()),
            FieldValue::Text(s) if field == "version" => version_token(s),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Text(s) => strip_token(s),
        };

        if group == FieldGroup::Platform
            && field == "name"
            && VERSIONED_PLATFORM_NAMES.contains(&token.as_str())
        {
            let version = siblings
                .iter()
                .find(|(name, _)| *name == "version")
                .map(|(_, value)| self.normalize(group, "version", value, &[]));
            if let Some(NormalizedValue::Value(version)) = version {
                token.push_str(&version);
            }
        }

        if let Some(canonical) = self.synonyms.lookup(group, field, &token) {
            trace!("synonym {}.{}: {} -> {}", group, field, token, canonical);
            token = canonical_token(group, field, canonical);
        }

        NormalizedValue::from_token(token)
    }

    pub fn normalize_record(&self, record: &ParsedRecord) -> NormalizedRecord {
        let mut sections = BTreeMap::new();
        for group in FieldGroup::ALL {
            let fields = record.section(group);
            let section: NormalizedSection = fields
                .iter()
                .filter(|(_, value)| value.is_scalar())
                .map(|(name, value)| (*name, self.normalize(group, name, value, &fields)))
                .collect();
            sections.insert(group, section);
        }
        NormalizedRecord { sections }
    }
}

fn version_token(raw: &str) -> String {
    raw.to_lowercase()
        .replace('_', ".")
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".")
}

fn strip_token(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

// Synonym canonicals are free text in the map file. They get the same
// reduction as a raw value of the field so that normalizing twice is stable.
fn canonical_token(group: FieldGroup, field: &str, canonical: &str) -> String {
    if field == "version" {
        return version_token(canonical);
    }
    let stripped = strip_token(canonical);
    let versioned_platform = group == FieldGroup::Platform
        && field == "name"
        && VERSIONED_PLATFORM_NAMES
            .iter()
            .any(|name| stripped.starts_with(name));
    if versioned_platform {
        // keeps the appended version's dot
        return canonical
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.')
            .collect();
    }
    stripped
}
