//! Text normalization applied before chunking.

use mingyu_core::{AppError, AppResult};
use regex::Regex;

/// Strips URL-shaped tokens and collapses whitespace.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    url: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    pub fn new() -> AppResult<Self> {
        let url = Regex::new(r"(?:https?://|www\.)\S+")
            .map_err(|e| AppError::Knowledge(format!("Invalid URL pattern: {}", e)))?;
        let whitespace = Regex::new(r"\s+")
            .map_err(|e| AppError::Knowledge(format!("Invalid whitespace pattern: {}", e)))?;
        Ok(Self { url, whitespace })
    }

    /// Remove URLs, collapse whitespace runs (newlines included) to one
    /// space, and trim the ends.
    pub fn clean(&self, text: &str) -> String {
        let without_urls = self.url.replace_all(text, "");
        self.whitespace
            .replace_all(&without_urls, " ")
            .trim()
            .to_string()
    }
}
