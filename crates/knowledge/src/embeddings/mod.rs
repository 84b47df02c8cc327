//! Embedding engine for knowledge bases.
//!
//! Provider-agnostic text encoding plus the small amount of vector math the
//! index and interpolation engine share.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use mingyu_core::{AppError, AppResult};

/// Euclidean norm.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product; callers guarantee equal lengths.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scale to unit length; zero vectors are left untouched.
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Encode texts in batches of `batch_size`, preserving input order.
pub async fn encode_texts(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(texts.len());

    tracing::info!(
        "Embedding {} texts using provider '{}' (model: {})",
        texts.len(),
        provider.provider_name(),
        provider.model_name()
    );

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Knowledge(format!(
                "Provider returned {} embeddings for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        embeddings.extend(vectors);
        tracing::debug!("Embedded batch {} ({} / {})", i + 1, embeddings.len(), texts.len());
    }

    Ok(embeddings)
}
