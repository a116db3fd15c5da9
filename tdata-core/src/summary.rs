//! Summary of a datasheet bucketed by taxonomy category, and the artifact that may
//! replace it after enrichment.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::taxonomy::Category;

/// Mapping from every taxonomy category to its matched text.
///
/// `device_name` holds at most one string (the last match); every other category holds
/// its matches in document order. The key set is always the full taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    device_name: String,
    buckets: BTreeMap<Category, Vec<String>>,
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

impl Summary {
    /// A summary with every category empty.
    pub fn new() -> Self {
        let buckets = Category::ALL
            .iter()
            .filter(|c| **c != Category::DeviceName)
            .map(|c| (*c, Vec::new()))
            .collect();
        Self {
            device_name: String::new(),
            buckets,
        }
    }

    /// Record `text` under `category`: assigns for `device_name`, appends otherwise.
    pub fn record(&mut self, category: Category, text: impl Into<String>) {
        let text = text.into();
        match category {
            Category::DeviceName => self.device_name = text,
            other => self.buckets.entry(other).or_default().push(text),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Entries of a list category. `device_name` is not a list; use [`Summary::device_name`].
    pub fn bucket(&self, category: Category) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of recorded texts, counting a set device name as one.
    pub fn matched_count(&self) -> usize {
        let names = usize::from(!self.device_name.is_empty());
        names + self.buckets.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.matched_count() == 0
    }

    /// Pretty JSON with a 4-space indent.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        to_pretty_json(self)
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for category in Category::ALL {
            let key = category.as_str();
            match category {
                Category::DeviceName => map.serialize_entry(key, &self.device_name)?,
                other => map.serialize_entry(key, self.bucket(*other))?,
            }
        }
        map.end()
    }
}

/// Why a structured value could not be read as a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryShapeError {
    #[error("summary must be a JSON object")]
    NotAnObject,
    #[error("unknown summary key: {0}")]
    UnknownKey(String),
    #[error("summary key {0} has the wrong type")]
    WrongType(&'static str),
}

impl TryFrom<Value> for Summary {
    type Error = SummaryShapeError;

    /// Absent keys default to empty so the key-set invariant still holds.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = value else {
            return Err(SummaryShapeError::NotAnObject);
        };
        let mut summary = Summary::new();
        for (key, value) in object {
            let category: Category = key
                .parse()
                .map_err(|_| SummaryShapeError::UnknownKey(key.clone()))?;
            match (category, value) {
                (Category::DeviceName, Value::String(name)) => summary.device_name = name,
                (Category::DeviceName, _) => {
                    return Err(SummaryShapeError::WrongType(category.as_str()))
                }
                (other, Value::Array(items)) => {
                    let texts = items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s),
                            _ => Err(SummaryShapeError::WrongType(other.as_str())),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    summary.buckets.insert(other, texts);
                }
                (other, _) => return Err(SummaryShapeError::WrongType(other.as_str())),
            }
        }
        Ok(summary)
    }
}

impl<'de> Deserialize<'de> for Summary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Summary::try_from(value).map_err(de::Error::custom)
    }
}

/// The summary handed to synthesis: either the bucketed structure or, when an
/// enrichment reply could not be reconciled with that shape, the raw reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryArtifact {
    Structured(Summary),
    Raw(String),
}

impl SummaryArtifact {
    /// File contents for `summary.json`. Raw text is written as a JSON string literal.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        match self {
            SummaryArtifact::Structured(summary) => to_pretty_json(summary),
            SummaryArtifact::Raw(text) => to_pretty_json(text),
        }
    }

    /// Text handed to the synthesis model; identical to the persisted file contents.
    pub fn to_prompt_text(&self) -> Result<String, serde_json::Error> {
        self.to_pretty_json()
    }

    /// Read back a persisted `summary.json`. Anything that is not a summary or a JSON
    /// string is kept verbatim as raw text.
    pub fn from_json_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::String(raw)) => SummaryArtifact::Raw(raw),
            Ok(value @ Value::Object(_)) => match Summary::try_from(value) {
                Ok(summary) => SummaryArtifact::Structured(summary),
                Err(_) => SummaryArtifact::Raw(text.to_string()),
            },
            _ => SummaryArtifact::Raw(text.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, SummaryArtifact::Structured(_))
    }
}

pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(
    value: &T,
) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}
