//! Ollama embedding provider.
//!
//! Calls `POST {endpoint}/api/embeddings` once per text. Vectors are
//! normalized client-side and checked against the configured dimensions.
//! No retries: a failed request fails the build.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::normalize_in_place;
use crate::embeddings::provider::EmbeddingProvider;
use mingyu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Self {
        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            client: reqwest::Client::new(),
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }

    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Knowledge(format!(
                    "Ollama not available at {}: {}. Ensure it is running and run: ollama pull {}",
                    self.base_url, e, self.model
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(AppError::Knowledge(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to parse Ollama response: {}", e))
        })?;

        finish_embedding(body.embedding, self.dimensions)
    }
}

/// Check the dimension and normalize a raw provider vector.
fn finish_embedding(mut embedding: Vec<f32>, dimensions: usize) -> AppResult<Vec<f32>> {
    if embedding.len() != dimensions {
        return Err(AppError::Knowledge(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            embedding.len(),
            dimensions
        )));
    }
    normalize_in_place(&mut embedding);
    Ok(embedding)
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts with {}", texts.len(), self.model);

        // No batch endpoint; embed sequentially
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::l2_norm;

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "bge-m3".to_string(),
            dimensions: 3,
            endpoint: Some("http://gpu-box:11434/".to_string()),
            batch_size: 8,
        }
    }

    #[test]
    fn test_provider_settings() {
        let provider = OllamaProvider::new(&config());
        assert_eq!(provider.base_url, "http://gpu-box:11434");
        assert_eq!(provider.model_name(), "bge-m3");
        assert_eq!(provider.dimensions(), 3);
    }

    #[test]
    fn test_default_endpoint() {
        let provider = OllamaProvider::new(&EmbeddingConfig {
            endpoint: None,
            ..config()
        });
        assert_eq!(provider.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(EmbeddingRequest {
            model: "bge-m3",
            prompt: "于谦",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "bge-m3", "prompt": "于谦"}));
    }

    #[test]
    fn test_finish_embedding_normalizes() {
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"embedding":[3.0,0.0,4.0]}"#).unwrap();
        let embedding = finish_embedding(response.embedding, 3).unwrap();
        assert!((l2_norm(&embedding) - 1.0).abs() < 1e-6);
        assert!((embedding[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_finish_embedding_rejects_wrong_dimensions() {
        assert!(finish_embedding(vec![1.0, 0.0], 3).is_err());
    }
}
