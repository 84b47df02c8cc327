//! MingYu CLI
//!
//! Main entry point for the `mingyu` command-line tool: build a Ming-dynasty
//! corpus index, search it, and explore counterfactuals against it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BiographyCommand, CorpusCommand, ExploreCommand, SearchCommand, ValidateCommand};
use mingyu_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// MingYu - historical retrieval and counterfactual exploration
#[derive(Parser, Debug)]
#[command(name = "mingyu")]
#[command(about = "Ming-dynasty historical retrieval and counterfactual exploration", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MINGYU_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MINGYU_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (dashscope, ollama)
    #[arg(short, long, global = true, env = "MINGYU_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "MINGYU_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Corpus management (fetch, build, stats)
    Corpus(CorpusCommand),

    /// Nearest chunks to a query
    Search(SearchCommand),

    /// Explore a counterfactual
    Explore(ExploreCommand),

    /// Check text against Ming institutional vocabulary
    Validate(ValidateCommand),

    /// Look up a person in CBDB
    Biography(BiographyCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let mut config = AppConfig::load()?;

    // A different workspace or config path means a different config file
    if cli.workspace.is_some() || cli.config.is_some() {
        config = config
            .with_overrides(
                cli.workspace.clone(),
                cli.config.clone(),
                None,
                None,
                None,
                false,
                false,
            )
            .reload_file()?;
    }

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("MingYu CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure .mingyu directory exists
    config.ensure_mingyu_dir()?;

    let command_name = match &cli.command {
        Commands::Corpus(_) => "corpus",
        Commands::Search(_) => "search",
        Commands::Explore(_) => "explore",
        Commands::Validate(_) => "validate",
        Commands::Biography(_) => "biography",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Corpus(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Explore(cmd) => cmd.execute(&config).await,
        Commands::Validate(cmd) => cmd.execute(&config).await,
        Commands::Biography(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
