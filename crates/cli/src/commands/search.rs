//! Search command handler.

use crate::commands::{print_json, snippet};
use clap::Args;
use mingyu_core::{config::AppConfig, AppResult};

const SNIPPET_CHARS: usize = 80;

/// Nearest chunks to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Knowledge base name (default: retrieval.base from config)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = self.base.as_deref().unwrap_or(&config.retrieval.base);
        tracing::info!("Executing search command on base '{}'", base);

        let engine = mingyu_knowledge::open_engine(&config.workspace, base)?;
        let results = engine.search(&self.query, self.top_k).await?;

        if self.json {
            return print_json(&results);
        }

        if results.is_empty() {
            println!("No results.");
            return Ok(());
        }

        for (rank, result) in results.iter().enumerate() {
            println!(
                "{}. [{:.4}] {} ({})",
                rank + 1,
                result.score,
                result.chunk.id,
                result.chunk.category
            );
            println!("   {}", snippet(&result.chunk.text, SNIPPET_CHARS));
        }

        Ok(())
    }
}
