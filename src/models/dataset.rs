//! Merged, name-keyed view over all segments.

use indexmap::IndexMap;

use super::emoji::{EmojiRecord, Segment};

/// All emoji records merged from an ordered list of segments.
///
/// Iteration order is merge insertion order. A name seen again in a later
/// segment replaces the earlier record but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    prefix: String,
    records: IndexMap<String, EmojiRecord>,
    duplicate_names: usize,
}

impl Dataset {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            records: IndexMap::new(),
            duplicate_names: 0,
        }
    }

    /// Merge a segment into the dataset; later segments win on name collision.
    pub fn merge(&mut self, segment: Segment) {
        for (name, entry) in segment.emojis {
            let record = EmojiRecord::from_entry(name.clone(), entry);
            if self.records.insert(name, record).is_some() {
                self.duplicate_names += 1;
            }
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get(&self, name: &str) -> Option<&EmojiRecord> {
        self.records.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmojiRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of merges that replaced an existing name.
    pub fn duplicate_names(&self) -> usize {
        self.duplicate_names
    }
}
