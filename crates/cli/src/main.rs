//! Alertsbot CLI
//!
//! Main entry point for the alertsbot command-line tool.
//! Builds the article corpus and answers questions grounded in it.

mod commands;

use alertsbot_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, BuildCommand, ChatCommand, ContextCommand, PromptsCommand, SearchCommand,
    StatsCommand,
};
use std::path::PathBuf;

/// Alertsbot - answers questions from a corpus of scraped news articles
#[derive(Parser, Debug)]
#[command(name = "alertsbot")]
#[command(about = "Question answering over scraped news articles", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ALERTSBOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ALERTSBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus directory (default: corpus.path from config, else .alertsbot/corpus)
    #[arg(long, global = true, env = "ALERTSBOT_CORPUS")]
    corpus: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "ALERTSBOT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "ALERTSBOT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import scraped articles and build the corpus
    Build(BuildCommand),

    /// Show the articles closest to a query
    Search(SearchCommand),

    /// Print the context block the model would receive
    Context(ContextCommand),

    /// Answer a question from the corpus
    Ask(AskCommand),

    /// Answer questions read line by line from stdin
    Chat(ChatCommand),

    /// Show corpus statistics
    Stats(StatsCommand),

    /// List available answer prompts
    Prompts(PromptsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Build(_) => "build",
            Commands::Search(_) => "search",
            Commands::Context(_) => "context",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Stats(_) => "stats",
            Commands::Prompts(_) => "prompts",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file choose which YAML is merged
    let config = AppConfig::load_from(cli.workspace, cli.config)?;

    let config = config.with_overrides(
        cli.corpus,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Logs go to stderr; stdout carries command output only
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Alertsbot CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_alertsbot_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Context(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config).await,
    };

    match result {
        Ok(()) => {
            tracing::info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("{}", commands::describe_error(&e));
            std::process::exit(commands::exit_code(&e));
        }
    }
}
