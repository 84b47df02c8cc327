//! Corpus command handler.
//!
//! Fetches source entries and builds or inspects knowledge bases.

use crate::commands::{print_json, workspace_path};
use clap::{Args, Subcommand};
use mingyu_core::{config::AppConfig, AppError, AppResult};
use mingyu_knowledge::fetch::{FetchOptions, WikiFetcher};
use mingyu_knowledge::BuildOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Corpus management (fetch, build, stats)
#[derive(Args, Debug)]
pub struct CorpusCommand {
    #[command(subcommand)]
    pub action: CorpusAction,
}

#[derive(Subcommand, Debug)]
pub enum CorpusAction {
    /// Download Wikipedia entries as plain text
    Fetch(CorpusFetchCommand),
    /// Chunk, embed and index a directory of entries
    Build(CorpusBuildCommand),
    /// Show knowledge base statistics
    Stats(CorpusStatsCommand),
}

/// Download entries
#[derive(Args, Debug)]
pub struct CorpusFetchCommand {
    /// Entry titles or article URLs
    pub titles: Vec<String>,

    /// File with one title or URL per line ('#' starts a comment)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "corpus")]
    pub out: PathBuf,

    /// Re-download entries that already exist
    #[arg(long)]
    pub force: bool,

    /// Pause between requests in milliseconds
    #[arg(long, default_value = "2000")]
    pub delay_ms: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusFetchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing corpus fetch command");

        let mut titles = self.titles.clone();
        if let Some(file) = &self.file {
            titles.extend(read_title_list(&workspace_path(config, file))?);
        }

        if titles.is_empty() {
            return Err(AppError::Config(
                "No titles given. Pass titles or --file".to_string(),
            ));
        }

        let out_dir = workspace_path(config, &self.out);
        let options = FetchOptions {
            force: self.force,
            delay: Duration::from_millis(self.delay_ms),
        };

        let fetcher = WikiFetcher::new()?;
        let stats = fetcher.fetch(&titles, &out_dir, &options).await?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Fetched {} of {} entries into {} ({} skipped, {} failed)",
                stats.fetched,
                stats.requested,
                out_dir.display(),
                stats.skipped,
                stats.failed
            );
        }

        Ok(())
    }
}

/// Titles from a list file, blank lines and comments removed.
fn read_title_list(path: &Path) -> AppResult<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read title list {:?}: {}", path, e)))?;

    Ok(parse_title_list(&content))
}

fn parse_title_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Build a knowledge base
#[derive(Args, Debug)]
pub struct CorpusBuildCommand {
    /// Directory of `*.txt` entries
    #[arg(short, long, default_value = "corpus")]
    pub source: PathBuf,

    /// Knowledge base name (default: retrieval.base from config)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Minimum characters per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = self
            .base
            .clone()
            .unwrap_or_else(|| config.retrieval.base.clone());
        tracing::info!("Executing corpus build command for base '{}'", base);

        let options = BuildOptions {
            base_name: base,
            source_dir: workspace_path(config, &self.source),
            chunk_size: self.chunk_size,
        };

        let stats = mingyu_knowledge::build(&config.workspace, options).await?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Built '{}': {} documents ({} skipped), {} chunks, {} bytes in {:.2}s",
                stats.base_name,
                stats.documents_read,
                stats.documents_skipped,
                stats.chunks_count,
                stats.bytes_processed,
                stats.duration_secs
            );
            println!(
                "  person: {}  event/institution: {}  text/canon: {}",
                stats.categories.person,
                stats.categories.event_institution,
                stats.categories.text_canon
            );
            println!(
                "  {} ({}), {} dimensions",
                stats.provider, stats.model, stats.dimensions
            );
        }

        Ok(())
    }
}

/// Show knowledge base stats
#[derive(Args, Debug)]
pub struct CorpusStatsCommand {
    /// Knowledge base name (default: retrieval.base from config)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = self.base.as_deref().unwrap_or(&config.retrieval.base);
        tracing::info!("Executing corpus stats command for base '{}'", base);

        let stats = mingyu_knowledge::stats(&config.workspace, base)?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!("Knowledge base: {}", stats.base_name);
            println!("  Chunks: {}", stats.chunks_count);
            println!(
                "  Categories: person {}, event/institution {}, text/canon {}",
                stats.categories.person,
                stats.categories.event_institution,
                stats.categories.text_canon
            );
            println!("  Dimensions: {}", stats.dimensions);
            println!("  DB size: {} bytes", stats.db_size_bytes);
            println!("  Fingerprint: {}", stats.fingerprint);
            if let Some(build) = &stats.last_build {
                println!(
                    "  Last build: {} ({} documents, {} / {})",
                    build.built_at, build.documents_read, build.provider, build.model
                );
            }
        }

        Ok(())
    }
}

impl CorpusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            CorpusAction::Fetch(cmd) => cmd.execute(config).await,
            CorpusAction::Build(cmd) => cmd.execute(config).await,
            CorpusAction::Stats(cmd) => cmd.execute(config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_list() {
        let content = "# 人物\n海瑞\n\n  https://zh.wikipedia.org/wiki/于谦  \n# 事件\n土木堡之变\n";
        assert_eq!(
            parse_title_list(content),
            vec![
                "海瑞".to_string(),
                "https://zh.wikipedia.org/wiki/于谦".to_string(),
                "土木堡之变".to_string()
            ]
        );
    }

    #[test]
    fn test_read_title_list_missing_file() {
        assert!(read_title_list(Path::new("/nonexistent/titles.txt")).is_err());
    }
}
