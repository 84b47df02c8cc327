//! In-memory embedding index.
//!
//! Chunks and their vectors are owned together and never mutated after
//! construction, so row `i` of one always belongs to row `i` of the other.

use crate::embeddings::{dot, encode_texts, EmbeddingProvider};
use crate::types::{CategoryCounts, Chunk, ScoredChunk};
use crate::vector_index::VectorIndex;
use mingyu_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// Pair chunks with their vectors.
    ///
    /// Rejects count mismatches, ragged or zero-width vectors, and
    /// duplicate chunk ids.
    pub fn new(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        if chunks.len() != vectors.len() {
            return Err(AppError::Knowledge(format!(
                "Chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dimensions == 0 {
            return Err(AppError::Knowledge(
                "Embedding vectors must not be empty".to_string(),
            ));
        }

        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimensions) {
            return Err(AppError::Knowledge(format!(
                "Ragged embeddings: row {} has {} dimensions, expected {}",
                i,
                v.len(),
                dimensions
            )));
        }

        let mut seen = HashSet::with_capacity(chunks.len());
        for chunk in &chunks {
            if !seen.insert(chunk.id.as_str()) {
                return Err(AppError::Knowledge(format!(
                    "Duplicate chunk id: {}",
                    chunk.id
                )));
            }
        }

        Ok(Self {
            chunks,
            vectors,
            dimensions,
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Row of the chunk with this id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.chunks.iter().position(|c| c.id == id)
    }

    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for chunk in &self.chunks {
            counts.record(chunk.category);
        }
        counts
    }

    /// SHA-256 hex digest over ids, texts and little-endian vector bytes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (chunk, vector) in self.chunks.iter().zip(&self.vectors) {
            hasher.update(chunk.id.as_bytes());
            hasher.update([0u8]);
            hasher.update(chunk.text.as_bytes());
            hasher.update([0u8]);
            for value in vector {
                hasher.update(value.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

impl VectorIndex for EmbeddingIndex {
    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        if self.chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }

        if query.len() != self.dimensions {
            tracing::warn!(
                "Query has {} dimensions but the index has {}; returning no results",
                query.len(),
                self.dimensions
            );
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(query, v)))
            .collect();

        // Stable: equal scores keep index order. NaN sorts first under
        // total_cmp instead of scrambling the ranking.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                score,
                position,
                chunk: self.chunks[position].clone(),
            })
            .collect()
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }
}

/// Encode every chunk once, in chunk order, and pair the results.
pub async fn build_index(
    chunks: Vec<Chunk>,
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<EmbeddingIndex> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = encode_texts(provider, &texts, batch_size).await?;

    if let Some(v) = vectors.iter().find(|v| v.len() != provider.dimensions()) {
        return Err(AppError::Knowledge(format!(
            "Provider '{}' returned {} dimensions, expected {}",
            provider.provider_name(),
            v.len(),
            provider.dimensions()
        )));
    }

    EmbeddingIndex::new(chunks, vectors)
}
