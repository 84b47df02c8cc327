//! Embedding configuration derived from a base's config.yaml.

use crate::config::{load_config, KnowledgeBaseConfig};
use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Embedding settings for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ngram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Endpoint for network providers
    pub endpoint: Option<String>,

    /// Maximum batch size for embedding requests
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from(&KnowledgeBaseConfig::default())
    }
}

impl From<&KnowledgeBaseConfig> for EmbeddingConfig {
    fn from(base: &KnowledgeBaseConfig) -> Self {
        Self {
            provider: base.provider.clone(),
            model: base.model.clone(),
            dimensions: base.embedding_dim,
            endpoint: base.endpoint.clone(),
            batch_size: base.batch_size,
        }
    }
}

impl EmbeddingConfig {
    /// Load embedding config from the base config.yaml.
    pub fn load(workspace: &Path, base_name: &str) -> AppResult<Self> {
        let base = load_config(workspace, base_name)?;
        Ok(Self::from(&base))
    }

    /// Check that an index built with `dimensions` can be queried with this config.
    pub fn validate_dimensions(&self, dimensions: usize) -> AppResult<()> {
        if self.dimensions != dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: index has {}, config expects {}. Rebuild the index.",
                dimensions, self.dimensions
            )));
        }
        Ok(())
    }
}
