//! Exploration engine: anchor retrieval plus interpolation.

use crate::alignment;
use crate::embeddings::EmbeddingProvider;
use crate::explore::types::Exploration;
use crate::index::EmbeddingIndex;
use crate::interpolate::interpolate;
use crate::keywords::KeywordExtractor;
use crate::types::ScoredChunk;
use crate::vector_index::VectorIndex;
use mingyu_core::{AppError, AppResult};
use std::sync::Arc;

/// Loaded index, query encoder and keyword extractor.
///
/// Built once per process and shared by reference; the index is immutable
/// so concurrent readers need no locking.
#[derive(Clone)]
pub struct HistoryEngine {
    index: Arc<EmbeddingIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    keywords: Arc<KeywordExtractor>,
}

impl HistoryEngine {
    pub fn new(index: Arc<EmbeddingIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            provider,
            keywords: Arc::new(KeywordExtractor::new()),
        }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn keywords(&self) -> &KeywordExtractor {
        &self.keywords
    }

    /// Encode `text` with the index's embedding provider.
    pub async fn encode(&self, text: &str) -> AppResult<Vec<f32>> {
        self.provider.embed(text).await
    }

    /// Top-k chunks nearest to `query`.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        let vector = self.encode(query).await?;
        Ok(self.index.search(&vector, top_k))
    }

    /// Anchor the query in the corpus and search around the blend of the
    /// anchor and the query.
    pub async fn explore(
        &self,
        query: &str,
        alpha: f32,
        neighbor_count: usize,
    ) -> AppResult<Exploration> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Knowledge("Query must not be empty".to_string()));
        }

        tracing::info!(
            "Exploring '{}' (alpha={}, neighbors={})",
            query,
            alpha,
            neighbor_count
        );

        let query_vector = self.encode(query).await?;

        let anchor = self
            .index
            .search(&query_vector, 1)
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::EmptyCorpus("The index has no chunks to anchor the query".to_string())
            })?;

        let fact_vector = self
            .index
            .vector(anchor.position)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| {
                AppError::Knowledge(format!("No vector stored for anchor {}", anchor.chunk.id))
            })?;

        tracing::debug!(
            "Anchor: {} (score {:.4})",
            anchor.chunk.id,
            anchor.score
        );

        let result = interpolate(
            self.index.as_ref(),
            &fact_vector,
            &query_vector,
            alpha,
            Some(anchor.chunk.id.as_str()),
            neighbor_count,
        )?;

        let neighbors = if result.gen_vector.iter().all(|x| *x == 0.0) {
            Vec::new()
        } else {
            result.neighbors
        };

        let best_match_alignment = neighbors
            .first()
            .map(|best| alignment::validate(&best.chunk.text));

        tracing::info!(
            "Found {} neighbors{}",
            neighbors.len(),
            if result.degenerate { " (degenerate blend)" } else { "" }
        );

        Ok(Exploration {
            query: query.to_string(),
            alpha,
            anchor,
            neighbors,
            best_match_alignment,
            degenerate: result.degenerate,
            query_vector,
            fact_vector,
            gen_vector: result.gen_vector,
        })
    }
}

impl std::fmt::Debug for HistoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("chunks", &self.index.len())
            .field("dimensions", &self.index.dimensions())
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}
