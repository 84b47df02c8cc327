//! Embedding provider implementations.

pub mod ngram;
pub mod ollama;

pub use ngram::NgramProvider;
pub use ollama::OllamaProvider;
