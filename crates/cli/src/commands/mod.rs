//! Command handlers for the MingYu CLI.
//!
//! Each subcommand lives in its own module and exposes an
//! `execute(&AppConfig)` entry point.

pub mod biography;
pub mod corpus;
pub mod explore;
pub mod search;
pub mod validate;

// Re-export command types for convenience
pub use biography::BiographyCommand;
pub use corpus::CorpusCommand;
pub use explore::ExploreCommand;
pub use search::SearchCommand;
pub use validate::ValidateCommand;

use mingyu_core::{config::AppConfig, AppResult};
use mingyu_llm::{create_client, LlmClient};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve a possibly relative path against the workspace.
pub(crate) fn workspace_path(config: &AppConfig, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.workspace.join(path)
    }
}

/// Generation client for the configured provider.
///
/// `None` when the provider cannot be set up, most often because no API
/// key is configured; callers report generation as unavailable.
pub(crate) fn generation_client(config: &AppConfig) -> Option<Arc<dyn LlmClient>> {
    let api_key = config.resolve_api_key(&config.provider);

    match create_client(
        &config.provider,
        config.provider_endpoint(),
        api_key.as_deref(),
        config.provider_timeout(),
    ) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("Generation unavailable: {}", e);
            None
        }
    }
}

/// Shorten `text` to at most `max_chars` characters.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars).collect();
    short.push('…');
    short
}
