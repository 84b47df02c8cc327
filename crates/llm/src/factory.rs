//! LLM provider factory.
//!
//! Resolves a provider name plus optional endpoint, key and timeout into a
//! ready client.

use std::sync::Arc;
use std::time::Duration;

use crate::client::LlmClient;
use crate::providers::{DashScopeClient, OllamaClient};
use crate::types::{ProviderType, DEFAULT_TIMEOUT_SECS};
use mingyu_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("dashscope", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by DashScope)
/// * `timeout_secs` - Optional request timeout, defaults to 30 seconds
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Llm(format!("Unknown provider: {}", provider)))?;
    let endpoint = endpoint.unwrap_or(provider_type.default_endpoint());
    let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    tracing::debug!(
        "Creating {} client at {} (timeout {:?})",
        provider_type.as_str(),
        endpoint,
        timeout
    );

    match provider_type {
        ProviderType::DashScope => {
            let key = api_key.ok_or_else(|| {
                AppError::Llm("DashScope provider requires API key".to_string())
            })?;
            Ok(Arc::new(DashScopeClient::with_options(endpoint, key, timeout)?))
        }
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::with_options(endpoint, timeout)?)),
    }
}
