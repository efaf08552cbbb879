//! cotrag CLI
//!
//! Main entry point for the cotrag command-line tool.
//! Answers questions over a local document folder with chain-of-thought
//! sampling and a self-consistency vote.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, EvalCommand, PromptsCommand, SearchCommand};
use cotrag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// cotrag - explainable chain-of-thought RAG over local documents
#[derive(Parser, Debug)]
#[command(name = "cotrag")]
#[command(about = "Explainable chain-of-thought RAG over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "COTRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "COTRAG_CONFIG")]
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

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "COTRAG_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "COTRAG_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question with retrieval, sampling, and a vote
    Ask(AskCommand),

    /// Show retrieved passages without calling a model
    Search(SearchCommand),

    /// Score recorded answers against gold references
    Eval(EvalCommand),

    /// List prompt overrides in the workspace
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration; the CLI workspace decides which YAML file is read
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

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

    tracing::info!("cotrag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Eval(_) => "eval",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config),
        Commands::Eval(cmd) => cmd.execute(),
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) if e.is_llm() => tracing::error!(
            provider = %config.provider,
            model = %config.model,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "Model backend failed: {}",
            e
        ),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
