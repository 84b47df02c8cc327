//! Text generation provider implementations.

pub mod dashscope;
pub mod ollama;

pub use dashscope::DashScopeClient;
pub use ollama::OllamaClient;

/// Build a `reqwest` client with the request timeout applied.
pub(crate) fn http_client(timeout: std::time::Duration) -> mingyu_core::AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| mingyu_core::AppError::Llm(format!("Failed to build HTTP client: {}", e)))
}
