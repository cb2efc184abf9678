// src/pipeline/index.rs

//! Codepoint index over a loaded dataset.

use std::collections::HashMap;

use crate::models::Dataset;

/// Maps a `unicode` string (`"U+1F600"`, `"U+2764 U+FE0F"`) to an emoji name.
///
/// Built by walking the dataset in its merge order; when two records share a
/// `unicode` value the one visited later wins.
#[derive(Debug, Clone, Default)]
pub struct UnicodeIndex {
    by_unicode: HashMap<String, String>,
    duplicates: usize,
}

impl UnicodeIndex {
    pub fn build(dataset: &Dataset) -> Self {
        let mut by_unicode = HashMap::with_capacity(dataset.len());
        let mut duplicates = 0;

        for record in dataset.iter() {
            if let Some(previous) = by_unicode.insert(record.unicode.clone(), record.name.clone()) {
                log::debug!(
                    "Unicode {:?} shared by {} and {}; keeping {}",
                    record.unicode,
                    previous,
                    record.name,
                    record.name
                );
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            log::warn!(
                "{} records share a unicode value with an earlier record; later records won",
                duplicates
            );
        }

        Self {
            by_unicode,
            duplicates,
        }
    }

    /// Name of the record indexed under `unicode`.
    pub fn get(&self, unicode: &str) -> Option<&str> {
        self.by_unicode.get(unicode).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_unicode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unicode.is_empty()
    }

    /// Number of records that displaced an earlier record with the same unicode.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}
