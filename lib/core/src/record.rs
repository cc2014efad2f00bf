// Input records and the sources that replay them
use crate::Result;
use serde::{Deserialize, Serialize};

/// One observation: an id, its tags, and optional metadata.
///
/// The engine only ever reads records; callers own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub id: String,
    #[serde(deserialize_with = "crate::normalize::deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Display label for entity nodes (e.g. an album title).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form grouping for entity nodes (e.g. the artist).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaggedRecord {
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(id: impl Into<String>, tags: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: id.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            timestamp: None,
            label: None,
            category: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Iterates the non-empty tags.
    pub fn usable_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.as_str()).filter(|t| !t.trim().is_empty())
    }
}

/// Counts reported by a source after one full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub rows_read: usize,
    /// Rows the source could not decode and never handed to the visitor.
    pub rows_malformed: usize,
}

/// A re-iterable supply of records.
///
/// Each call to `scan` replays the whole input from the start, which is what
/// lets the entity graph builder make more than one pass.
pub trait RecordSource {
    fn scan(&self, visit: &mut dyn FnMut(&TaggedRecord)) -> Result<SourceStats>;
}

impl RecordSource for [TaggedRecord] {
    fn scan(&self, visit: &mut dyn FnMut(&TaggedRecord)) -> Result<SourceStats> {
        for record in self {
            visit(record);
        }
        Ok(SourceStats {
            rows_read: self.len(),
            rows_malformed: 0,
        })
    }
}

impl RecordSource for Vec<TaggedRecord> {
    fn scan(&self, visit: &mut dyn FnMut(&TaggedRecord)) -> Result<SourceStats> {
        self.as_slice().scan(visit)
    }
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn scan(&self, visit: &mut dyn FnMut(&TaggedRecord)) -> Result<SourceStats> {
        (**self).scan(visit)
    }
}
