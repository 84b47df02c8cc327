//! Corpus, index and retrieval engine for Ming-dynasty history.
//!
//! A base is built once from a directory of plain-text entries
//! (`mingyu corpus build`) and persisted as a single SQLite file. Queries
//! load it into a [`HistoryEngine`] that anchors a hypothetical in the
//! corpus and searches around an interpolation of the anchor and the query.

pub mod alignment;
pub mod audit;
pub mod biography;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod explore;
pub mod fetch;
pub mod index;
pub mod interpolate;
pub mod keywords;
pub mod projection;
pub mod store;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use config::KnowledgeBaseConfig;
pub use explore::{Enrichment, Exploration, ExplorationReport, HistoryEngine, Narrative};
pub use index::EmbeddingIndex;
pub use types::{BaseStats, BuildOptions, BuildStats, Category, Chunk, ScoredChunk};
pub use vector_index::VectorIndex;

use chrono::Utc;
use embeddings::{create_provider, EmbeddingConfig};
use mingyu_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Build (or rebuild) a base from a directory of `*.txt` entries.
///
/// The previous index stays in place when the build fails, including when
/// the corpus yields no chunks.
pub async fn build(workspace: &Path, options: BuildOptions) -> AppResult<BuildStats> {
    let start = Instant::now();

    tracing::info!(
        "Building knowledge base '{}' from {:?}",
        options.base_name,
        options.source_dir
    );

    let mut config = config::load_config(workspace, &options.base_name)?;
    if let Some(chunk_size) = options.chunk_size {
        config.chunk_size = chunk_size;
    }

    let outcome = corpus::read_documents(&options.source_dir)?;
    for path in &outcome.skipped {
        tracing::warn!("Skipped unreadable document {:?}", path);
    }

    let chunks = corpus::build_chunks(&outcome.documents, config.chunk_size)?;
    if chunks.is_empty() {
        return Err(AppError::EmptyCorpus(format!(
            "No chunks produced from {} documents in {:?}",
            outcome.documents.len(),
            options.source_dir
        )));
    }

    let embedding_config = EmbeddingConfig::from(&config);
    let provider = create_provider(&embedding_config)?;
    let index = index::build_index(chunks, provider.as_ref(), embedding_config.batch_size).await?;

    let index_path = config::get_index_path(workspace, &options.base_name);
    store::save_index(&index_path, &index)?;
    config::save_config(workspace, &config)?;

    let stats = BuildStats {
        base_name: options.base_name.clone(),
        documents_read: outcome.documents.len(),
        documents_skipped: outcome.skipped.len(),
        chunks_count: index.len(),
        categories: index.category_counts(),
        bytes_processed: outcome.bytes_read,
        dimensions: index.dimensions(),
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        fingerprint: index.fingerprint(),
        duration_secs: start.elapsed().as_secs_f64(),
        built_at: Utc::now(),
    };

    let stats_path = config::get_stats_path(workspace, &options.base_name);
    std::fs::write(&stats_path, serde_json::to_string_pretty(&stats)?)?;

    tracing::info!(
        "Built '{}': {} documents, {} chunks in {:.2}s",
        stats.base_name,
        stats.documents_read,
        stats.chunks_count,
        stats.duration_secs
    );

    Ok(stats)
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    tracing::info!("Getting stats for knowledge base '{}'", base_name);

    let index_path = config::get_index_path(workspace, base_name);
    let index = store::load_index(&index_path)?;

    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    let stats_path = config::get_stats_path(workspace, base_name);
    let last_build = match std::fs::read_to_string(&stats_path) {
        Ok(content) => match serde_json::from_str::<BuildStats>(&content) {
            Ok(build) => Some(build),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {:?}: {}", stats_path, e);
                None
            }
        },
        Err(_) => None,
    };

    Ok(BaseStats {
        base_name: base_name.to_string(),
        chunks_count: index.len(),
        dimensions: index.dimensions(),
        categories: index.category_counts(),
        db_size_bytes,
        fingerprint: index.fingerprint(),
        last_build,
    })
}

/// Load a base and its query encoder.
///
/// Fails with [`AppError::MissingIndex`] when the base was never built.
pub fn open_engine(workspace: &Path, base_name: &str) -> AppResult<HistoryEngine> {
    let index_path = config::get_index_path(workspace, base_name);
    let index = store::load_index(&index_path)?;

    let embedding_config = EmbeddingConfig::load(workspace, base_name)?;
    if !index.is_empty() {
        embedding_config.validate_dimensions(index.dimensions())?;
    }
    let provider = create_provider(&embedding_config)?;

    tracing::info!(
        "Loaded '{}': {} chunks, {} dimensions ({})",
        base_name,
        index.len(),
        index.dimensions(),
        provider.provider_name()
    );

    Ok(HistoryEngine::new(Arc::new(index), provider))
}
