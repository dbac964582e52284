//! Record identity and the domain-record contract
//!
//! - `RecordId`: opaque `(table, key)` handle issued by the store
//! - `Record`: implemented by every domain type mapped onto a table
//! - `Edge`: a directed, labelled relation between two records

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Key part of a [`RecordId`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Number(i64),
    String(String),
}

impl RecordKey {
    fn is_plain(key: &str) -> bool {
        !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !key.chars().all(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Number(n) => write!(f, "{n}"),
            RecordKey::String(s) if RecordKey::is_plain(s) => f.write_str(s),
            RecordKey::String(s) => write!(f, "⟨{}⟩", s.replace('⟩', "\\⟩")),
        }
    }
}

/// Identity of one record in one table.
///
/// Only the store issues ids: a `RecordId` is obtained by decoding a value the
/// store returned (usually the `id` field of a created record), never built
/// from parts by client code. Two ids are equal when table and key are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    table: String,
    key: RecordKey,
}

impl RecordId {
    pub(crate) fn new(table: impl Into<String>, key: RecordKey) -> Self {
        Self {
            table: table.into(),
            key,
        }
    }

    /// Table the record lives in
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Unique key within the table
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Parse the textual form `table:key`, accepting `⟨…⟩` and backtick
    /// escaped segments.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let (table, rest) = split_table(text)?;
        if table.is_empty() || rest.is_empty() {
            return None;
        }

        let key = if let Some(inner) = unwrap_escaped(rest) {
            RecordKey::String(inner)
        } else if let Ok(n) = rest.parse::<i64>() {
            RecordKey::Number(n)
        } else {
            RecordKey::String(rest.to_string())
        };

        Some(Self { table, key })
    }
}

fn split_table(text: &str) -> Option<(String, &str)> {
    for (open, close) in [('⟨', '⟩'), ('`', '`')] {
        if let Some(body) = text.strip_prefix(open) {
            let end = body.find(&format!("{close}:"))?;
            let table = body[..end].replace(&format!("\\{close}"), &close.to_string());
            return Some((table, &body[end + close.len_utf8() + 1..]));
        }
    }
    text.split_once(':')
        .map(|(table, rest)| (table.to_string(), rest))
}

fn unwrap_escaped(segment: &str) -> Option<String> {
    if let Some(inner) = segment
        .strip_prefix('⟨')
        .and_then(|s| s.strip_suffix('⟩'))
    {
        return Some(inner.replace("\\⟩", "⟩"));
    }
    segment
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .map(|inner| inner.replace("\\`", "`"))
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if RecordKey::is_plain(&self.table) {
            write!(f, "{}:{}", self.table, self.key)
        } else {
            write!(f, "⟨{}⟩:{}", self.table.replace('⟩', "\\⟩"), self.key)
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RecordId::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid record id `{text}`")))
    }
}

/// A domain type stored as one record.
///
/// Implementors are plain serde structs with an `id: Option<RecordId>` field
/// and `#[serde(default)]` on the container, so that fields missing from a
/// stored record decode to their defaults and unknown fields are ignored.
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Publisher {
///     id: Option<RecordId>,
///     name: String,
/// }
///
/// impl Record for Publisher {
///     fn id(&self) -> Option<&RecordId> {
///         self.id.as_ref()
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Store-assigned identity; `None` until the record has been created.
    fn id(&self) -> Option<&RecordId>;
}

/// Directed relation `from -[label]-> to`, stored as a record of table `label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: RecordId,
    #[serde(rename = "in")]
    pub from: RecordId,
    #[serde(rename = "out")]
    pub to: RecordId,
}

impl Edge {
    /// Edge type, i.e. the table the edge record lives in
    pub fn label(&self) -> &str {
        self.id.table()
    }
}

impl Record for Edge {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_string_key() {
        let id = RecordId::parse("book:k3x9a0").unwrap();
        assert_eq!(id.table(), "book");
        assert_eq!(id.key(), &RecordKey::String("k3x9a0".to_string()));
        assert_eq!(id.to_string(), "book:k3x9a0");
    }

    #[test]
    fn test_parse_numeric_key() {
        let id = RecordId::parse("book:42").unwrap();
        assert_eq!(id.key(), &RecordKey::Number(42));
        assert_eq!(id.to_string(), "book:42");
    }

    #[test]
    fn test_escaped_key_round_trips_through_display() {
        let id = RecordId::parse("book:⟨not plain-key⟩").unwrap();
        assert_eq!(id.key(), &RecordKey::String("not plain-key".to_string()));
        assert_eq!(id.to_string(), "book:⟨not plain-key⟩");

        let digits = RecordId::new("book", RecordKey::String("123".to_string()));
        assert_eq!(digits.to_string(), "book:⟨123⟩");
        assert_eq!(RecordId::parse(&digits.to_string()).unwrap(), digits);
    }

    #[test]
    fn test_backtick_key_is_unescaped() {
        let id = RecordId::parse("book:`a b`").unwrap();
        assert_eq!(id.key(), &RecordKey::String("a b".to_string()));
    }

    #[test]
    fn test_escaped_table() {
        let id = RecordId::parse("⟨my table⟩:abc").unwrap();
        assert_eq!(id.table(), "my table");
        assert_eq!(id.to_string(), "⟨my table⟩:abc");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(RecordId::parse("book").is_none());
        assert!(RecordId::parse(":abc").is_none());
        assert!(RecordId::parse("book:").is_none());
    }

    #[test]
    fn test_record_id_serde_uses_text_form() {
        let id = RecordId::parse("publisher:surreal").unwrap();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("publisher:surreal"));

        let back: RecordId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);

        let bad = serde_json::from_value::<RecordId>(serde_json::json!("nonsense"));
        assert!(bad.is_err());
    }

    #[test]
    fn test_edge_decodes_in_and_out() {
        let edge: Edge = serde_json::from_value(serde_json::json!({
            "id": "published_by:e1",
            "in": "book:b1",
            "out": "publisher:p1",
        }))
        .unwrap();

        assert_eq!(edge.label(), "published_by");
        assert_eq!(edge.from.to_string(), "book:b1");
        assert_eq!(edge.to.to_string(), "publisher:p1");
    }
}
