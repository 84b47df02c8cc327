//! Knowledge base configuration management.
//!
//! Each base lives under `.mingyu/bases/<base>/` with its own `config.yaml`.

use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    #[serde(default)]
    pub name: String,

    /// Minimum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Embedding provider ("ngram" or "ollama")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Endpoint for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Texts per embedding batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_chunk_size() -> usize {
    150
}

fn default_provider() -> String {
    "ngram".to_string()
}

fn default_model() -> String {
    "ngram-v1".to_string()
}

fn default_embedding_dim() -> usize {
    512
}

fn default_batch_size() -> usize {
    32
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            chunk_size: default_chunk_size(),
            provider: default_provider(),
            model: default_model(),
            embedding_dim: default_embedding_dim(),
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Load knowledge base configuration.
///
/// Loads from `.mingyu/bases/<base>/config.yaml` if it exists, otherwise
/// returns defaults with the provided base name.
pub fn load_config(workspace: &Path, base_name: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, base_name);

    if !config_path.exists() {
        tracing::debug!(
            "Using default knowledge base config for '{}' (no config file found)",
            base_name
        );
        return Ok(KnowledgeBaseConfig {
            name: base_name.to_string(),
            ..Default::default()
        });
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.name = base_name.to_string();
    validate_config(&config)?;

    tracing::debug!("Loaded knowledge base config for '{}'", base_name);
    Ok(config)
}

/// Save knowledge base configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge base config for '{}'", config.name);
    Ok(())
}

fn validate_config(config: &KnowledgeBaseConfig) -> AppResult<()> {
    if config.chunk_size == 0 {
        return Err(AppError::Knowledge(
            "chunkSize must be positive".to_string(),
        ));
    }
    if config.embedding_dim == 0 {
        return Err(AppError::Knowledge(
            "embeddingDim must be positive".to_string(),
        ));
    }
    if config.batch_size == 0 {
        return Err(AppError::Knowledge(
            "batchSize must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace.join(".mingyu").join("bases").join(base_name)
}

/// Get the path to a base's config file.
pub fn get_config_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("config.yaml")
}

/// Get the SQLite index path for a base.
pub fn get_index_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("index.sqlite")
}

/// Get the stats JSON path for a base.
pub fn get_stats_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("stats.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "ming").unwrap();

        assert_eq!(config.name, "ming");
        assert_eq!(config.provider, "ngram");
        assert_eq!(config.chunk_size, 150);
        assert_eq!(config.embedding_dim, 512);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "my-base".to_string(),
            chunk_size: 300,
            provider: "ollama".to_string(),
            model: "bge-m3".to_string(),
            embedding_dim: 1024,
            endpoint: Some("http://localhost:11434".to_string()),
            batch_size: 8,
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "my-base").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "ming");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chunkSize: 80\n").unwrap();

        let config = load_config(temp.path(), "ming").unwrap();
        assert_eq!(config.chunk_size, 80);
        assert_eq!(config.provider, "ngram");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "ming");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chunkSize: 0\n").unwrap();

        assert!(load_config(temp.path(), "ming").is_err());
    }

    #[test]
    fn test_paths() {
        let ws = Path::new("/ws");
        assert_eq!(
            get_index_path(ws, "ming"),
            PathBuf::from("/ws/.mingyu/bases/ming/index.sqlite")
        );
        assert!(get_stats_path(ws, "ming").ends_with("stats.json"));
    }
}
