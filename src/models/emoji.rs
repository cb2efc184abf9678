//! Emoji record and segment file structures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix that turns a base64 PNG payload into a data URI.
pub const DEFAULT_PREFIX: &str = "data:image/png;base64,";

/// One emoji as stored inside a segment, keyed by name in the parent map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentEntry {
    /// Space-joined `U+XXXX` codepoint tokens
    pub unicode: String,

    /// Base64 of the transcoded PNG
    #[serde(rename = "b64")]
    pub payload: String,
}

/// A persisted shard of the dataset.
///
/// On disk this is gzip-compressed JSON:
///
/// ```text
/// { "prefix": "data:image/png;base64,",
///   "emojis": { "grinning-face": { "unicode": "U+1F600", "b64": "iVBOR..." } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Segment {
    /// Data URI prefix; required on the first segment of a dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Entries in document order
    pub emojis: IndexMap<String, SegmentEntry>,
}

impl Segment {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            emojis: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }
}

/// A named emoji with its codepoints and encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRecord {
    pub name: String,
    pub unicode: String,
    pub payload: String,
}

impl EmojiRecord {
    pub fn from_entry(name: impl Into<String>, entry: SegmentEntry) -> Self {
        Self {
            name: name.into(),
            unicode: entry.unicode,
            payload: entry.payload,
        }
    }

    /// Compose `prefix + payload`.
    pub fn data_uri(&self, prefix: &str) -> String {
        let mut uri = String::with_capacity(prefix.len() + self.payload.len());
        uri.push_str(prefix);
        uri.push_str(&self.payload);
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_uses_b64_field_name() {
        let json = r#"{
            "prefix": "data:image/png;base64,",
            "emojis": { "grinning-face": { "unicode": "U+1F600", "b64": "AAA" } }
        }"#;
        let segment: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(segment.prefix.as_deref(), Some(DEFAULT_PREFIX));
        assert_eq!(segment.emojis["grinning-face"].payload, "AAA");
    }

    #[test]
    fn segment_without_emojis_is_rejected() {
        let result: Result<Segment, _> = serde_json::from_str(r#"{ "prefix": "x" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn segment_keeps_document_order() {
        let json = r#"{ "emojis": {
            "zebra": { "unicode": "U+1F993", "b64": "Z" },
            "apple": { "unicode": "U+1F34E", "b64": "A" }
        } }"#;
        let segment: Segment = serde_json::from_str(json).unwrap();
        let names: Vec<_> = segment.emojis.keys().map(String::as_str).collect();
        assert_eq!(names, ["zebra", "apple"]);
        assert!(segment.prefix.is_none());
    }

    #[test]
    fn data_uri_concatenates() {
        let record = EmojiRecord {
            name: "heart".into(),
            unicode: "U+2764".into(),
            payload: "QUJD".into(),
        };
        assert_eq!(record.data_uri(DEFAULT_PREFIX), "data:image/png;base64,QUJD");
    }
}
