//! Exploration result types.

use crate::alignment::Alignment;
use crate::audit::AuditReport;
use crate::biography::Biography;
use crate::types::{Category, ScoredChunk};
use serde::{Deserialize, Serialize};

/// Name the biography lookup never queries.
pub const UNKNOWN_NAME: &str = "未知";

/// Retrieval half of one request: anchor, interpolation, neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exploration {
    pub query: String,

    pub alpha: f32,

    /// Chunk nearest to the raw query
    pub anchor: ScoredChunk,

    /// Neighbors of the interpolated vector, anchor excluded
    pub neighbors: Vec<ScoredChunk>,

    /// Institutional alignment of the best match, if any
    pub best_match_alignment: Option<Alignment>,

    /// The blend nearly cancelled out
    pub degenerate: bool,

    /// Internal: vectors kept for projection
    #[serde(skip)]
    pub query_vector: Vec<f32>,

    #[serde(skip)]
    pub fact_vector: Vec<f32>,

    #[serde(skip)]
    pub gen_vector: Vec<f32>,
}

impl Exploration {
    /// First neighbor, the closest "potential historical record".
    pub fn best_match(&self) -> Option<&ScoredChunk> {
        self.neighbors.first()
    }

    /// Entry name worth a biography lookup.
    ///
    /// Only an institutionally aligned best match about a person with a
    /// known name qualifies.
    pub fn biography_candidate(&self) -> Option<&str> {
        let best = self.best_match()?;
        let aligned = self
            .best_match_alignment
            .as_ref()
            .is_some_and(|a| a.is_valid);

        if aligned && best.chunk.category == Category::Person && best.chunk.name != UNKNOWN_NAME {
            Some(best.chunk.name.as_str())
        } else {
            None
        }
    }
}

/// Generated counterfactual text with its checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub text: String,
    pub model: String,
    pub audit: AuditReport,
    pub alignment: Alignment,
}

/// Optional external result that may be missing without failing a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Enrichment<T> {
    Available { value: T },
    Unavailable { reason: String },
    Skipped,
}

impl<T> Enrichment<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Available { value } => Some(value),
            _ => None,
        }
    }
}

/// Everything one `explore` request produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationReport {
    #[serde(flatten)]
    pub exploration: Exploration,

    pub narrative: Enrichment<Narrative>,

    pub biography: Enrichment<Biography>,
}
