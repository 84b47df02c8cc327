//! Corpus builder: raw entries in, classified and chunked text out.
//!
//! Pipeline per document, in file-name order:
//! 1. classify the entry title
//! 2. strip URLs and collapse whitespace
//! 3. accumulate sentences into chunks of at least `chunk_size` characters
//!
//! Chunk ordinals are global across the run, so the same inputs always
//! produce the same ids.

pub mod chunker;
pub mod classify;
pub mod clean;
pub mod reader;

pub use chunker::chunk_document;
pub use classify::classify;
pub use clean::TextCleaner;
pub use reader::{decode_bytes, discover_documents, read_document, read_documents, ReadOutcome};

use crate::types::{Chunk, RawDocument};
use mingyu_core::{AppError, AppResult};

/// Turn raw documents into chunks.
pub fn build_chunks(documents: &[RawDocument], chunk_size: usize) -> AppResult<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(AppError::Knowledge(
            "Chunk size must be positive".to_string(),
        ));
    }

    let cleaner = TextCleaner::new()?;
    let mut chunks = Vec::new();

    for document in documents {
        let category = classify(&document.name);
        let cleaned = cleaner.clean(&document.text);
        let produced = chunk_document(&document.name, category, &cleaned, chunk_size, chunks.len());

        tracing::debug!(
            "{} ({}): {} chunks",
            document.name,
            category,
            produced.len()
        );
        chunks.extend(produced);
    }

    Ok(chunks)
}
