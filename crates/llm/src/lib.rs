//! Text generation crate for MingYu.
//!
//! Provider-agnostic access to the large language models that narrate
//! counterfactual scenarios. Providers sit behind the [`LlmClient`] trait so
//! the exploration engine can be driven by a stub in tests.
//!
//! # Providers
//! - **DashScope**: Hosted Qwen models (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use mingyu_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()?;
//! let request = LlmRequest::new("假如郑和继续下西洋", "qwen2.5:7b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{DashScopeClient, OllamaClient};
pub use types::ProviderType;
