//! Vector index abstraction.
//!
//! Retrieval code depends on this trait rather than on the concrete
//! in-memory index, so interpolation and exploration can be exercised
//! against hand-built fixtures.

use crate::types::{Chunk, ScoredChunk};

/// Read-only similarity index over chunks.
pub trait VectorIndex: Send + Sync {
    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of every stored vector (0 for an empty index).
    fn dimensions(&self) -> usize;

    /// Top-k chunks by dot product, descending, ties in index order.
    ///
    /// Returns an empty list for an empty index or a query of the wrong
    /// dimension.
    fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk>;

    /// Stored vector at `position`.
    fn vector(&self, position: usize) -> Option<&[f32]>;

    /// Chunk at `position`.
    fn chunk(&self, position: usize) -> Option<&Chunk>;
}
