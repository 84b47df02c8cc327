//! Error types for MingYu.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, index storage, retrieval, text
//! generation and prompt rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for MingYu.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Enrichment failures (generation, biography lookup) are not represented
/// here; they are folded into an "unavailable" status by their callers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted index artifact does not exist
    #[error("Index not found at {path:?}. Run 'mingyu corpus build' first.")]
    MissingIndex { path: PathBuf },

    /// A source document could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A corpus build produced no chunks, or a query ran against an empty index
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// Index storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Corpus, embedding and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
