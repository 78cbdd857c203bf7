// src/models/document.rs

//! Raw documents as ingested from the sheet, plus store identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// Field stamped on every document written by a sync run.
pub const SYNCED_AT_FIELD: &str = "_syncedAt";

/// A schemaless document: field name to JSON value.
///
/// Field names drift between rows and exports, so nothing about the shape is
/// assumed here; canonical attributes are resolved by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Map<String, Value>);

impl RawDocument {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Store identifier, if the document has been persisted.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Trimmed textual form of a field.
    ///
    /// Absent fields, empty strings, nulls, arrays and objects yield `None`.
    /// Numbers and booleans are read through their JSON text.
    pub fn text(&self, field: &str) -> Option<String> {
        let text = match self.0.get(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// First present, non-empty field among `aliases`, in order.
    pub fn first_text(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|field| self.text(field))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for RawDocument {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        )
    }
}

/// Store-assigned document identifier: 24 lowercase hex characters.
///
/// The first 8 characters encode the creation time in seconds, the remaining
/// 16 a per-store sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    const LEN: usize = 24;

    /// Parse and validate an identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let valid = input.len() == Self::LEN
            && input
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(input.to_string()))
        } else {
            Err(AppError::validation(format!(
                "'{input}' is not a valid document id (expected 24 lowercase hex characters)"
            )))
        }
    }

    pub(crate) fn from_parts(seconds: u32, sequence: u64) -> Self {
        Self(format!("{seconds:08x}{sequence:016x}"))
    }

    /// Sequence component of the identifier.
    pub fn sequence(&self) -> u64 {
        self.0
            .get(8..)
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => RawDocument::from(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_text_trims_and_skips_empty() {
        let d = doc(json!({ "a": "  hi ", "b": "   ", "c": 2200, "d": null, "e": [1] }));
        assert_eq!(d.text("a").as_deref(), Some("hi"));
        assert_eq!(d.text("b"), None);
        assert_eq!(d.text("c").as_deref(), Some("2200"));
        assert_eq!(d.text("d"), None);
        assert_eq!(d.text("e"), None);
        assert_eq!(d.text("missing"), None);
    }

    #[test]
    fn test_first_text_respects_alias_order() {
        let d = doc(json!({ "rp": "1700", "points": "90", "CUMULATIVE_REWARD_POINTS": "" }));
        let aliases = ["CUMULATIVE_REWARD_POINTS", "rp", "points"];
        assert_eq!(d.first_text(&aliases).as_deref(), Some("1700"));
    }

    #[test]
    fn test_document_id_roundtrip_parts() {
        let id = DocumentId::from_parts(0x6650_0000, 42);
        assert_eq!(id.as_str(), "66500000000000000000002a");
        assert_eq!(id.sequence(), 42);
        assert_eq!(DocumentId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_document_id_rejects_malformed() {
        assert!(DocumentId::parse("abc").is_err());
        assert!(DocumentId::parse("66500000000000000000002A").is_err());
        assert!(DocumentId::parse("66500000000000000000002g").is_err());
    }

    #[test]
    fn test_document_id_deserialize_validates() {
        let id: DocumentId = serde_json::from_value(json!("66500000000000000000002a")).unwrap();
        assert_eq!(id.sequence(), 42);
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("66500000000000000000002a"));

        assert!(serde_json::from_value::<DocumentId>(json!("abc")).is_err());
        assert!(serde_json::from_value::<DocumentId>(json!("not-hex-not-hex-not-hex!")).is_err());
    }
}
