//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Topical category of a source entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    #[serde(rename = "person")]
    Person,
    #[serde(rename = "event/institution")]
    EventInstitution,
    #[serde(rename = "text/canon")]
    TextCanon,
}

impl Category {
    /// Canonical serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::EventInstitution => "event/institution",
            Self::TextCanon => "text/canon",
        }
    }

    /// Parse a serialized category name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(Self::Person),
            "event/institution" => Some(Self::EventInstitution),
            "text/canon" => Some(Self::TextCanon),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded segment of cleaned source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<name>_<ordinal>` or `<name>_last`
    pub id: String,

    /// Source entry title
    pub name: String,

    pub category: Category,

    pub text: String,
}

/// A search hit: similarity score, row in the index, and the chunk itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub position: usize,
    pub chunk: Chunk,
}

/// A raw document handed to the corpus builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Entry title (file stem)
    pub name: String,

    /// Decoded, uncleaned text
    pub text: String,
}

/// Options for the corpus build operation.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Directory holding `*.txt` entries
    pub source_dir: PathBuf,

    /// Override the base's configured chunk size
    pub chunk_size: Option<usize>,
}

/// Per-category chunk counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub person: usize,
    pub event_institution: usize,
    pub text_canon: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Person => self.person += 1,
            Category::EventInstitution => self.event_institution += 1,
            Category::TextCanon => self.text_canon += 1,
        }
    }
}

/// Statistics from a corpus build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub base_name: String,

    /// Documents successfully read
    pub documents_read: usize,

    /// Documents that could not be read
    pub documents_skipped: usize,

    pub chunks_count: usize,

    pub categories: CategoryCounts,

    /// Raw bytes read from disk
    pub bytes_processed: u64,

    pub dimensions: usize,

    pub provider: String,

    pub model: String,

    /// SHA-256 over ids, texts and vectors
    pub fingerprint: String,

    pub duration_secs: f64,

    pub built_at: DateTime<Utc>,
}

/// Statistics for an existing knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub base_name: String,

    pub chunks_count: usize,

    pub dimensions: usize,

    pub categories: CategoryCounts,

    /// Index file size in bytes
    pub db_size_bytes: u64,

    pub fingerprint: String,

    /// Most recent build, if stats.json exists
    pub last_build: Option<BuildStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_string(&Category::EventInstitution).unwrap(),
            "\"event/institution\""
        );
        let parsed: Category = serde_json::from_str("\"text/canon\"").unwrap();
        assert_eq!(parsed, Category::TextCanon);
        assert_eq!(Category::default(), Category::Person);
    }

    #[test]
    fn test_category_parse_roundtrips_display() {
        for category in [Category::Person, Category::EventInstitution, Category::TextCanon] {
            assert_eq!(Category::parse(&category.to_string()), Some(category));
        }
        assert_eq!(Category::parse("dynasty"), None);
    }

    #[test]
    fn test_category_counts() {
        let mut counts = CategoryCounts::default();
        counts.record(Category::Person);
        counts.record(Category::Person);
        counts.record(Category::TextCanon);
        assert_eq!(counts.person, 2);
        assert_eq!(counts.event_institution, 0);
        assert_eq!(counts.text_canon, 1);
    }
}
