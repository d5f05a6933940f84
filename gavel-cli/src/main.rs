//! Gavel CLI - drive AI code reviews from the command line

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gavel_core::{CommandBackend, Config, LogNotifier, ReviewEngine};
use gavel_db::{Database, DatabaseConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{CancelArgs, CreateArgs, DeleteArgs, IssuesArgs, ListArgs, ResubmitArgs, ShowArgs};

/// Gavel: coordination engine for AI reviewer agents
#[derive(Parser, Debug)]
#[command(name = "gavel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the reviewer agent executable (overrides config and env)
    #[arg(long, global = true, env = "GAVEL_AGENT_PATH")]
    agent_path: Option<String>,

    /// Path to the review store (overrides config and env)
    #[arg(long, global = true, env = "GAVEL_DB_PATH")]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Request a review for a branch
    #[command(visible_alias = "c")]
    Create(CreateArgs),

    /// List reviews
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show one review in detail
    Show(ShowArgs),

    /// Resubmit a review at a new commit
    Resubmit(ResubmitArgs),

    /// Cancel a review
    Cancel(CancelArgs),

    /// Delete a review and its findings
    Delete(DeleteArgs),

    /// Inspect or update review findings
    Issues(IssuesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::load_with_overrides(cli.agent_path.clone(), cli.db_path.clone())?;

    let db_config = match &config.engine.database_path {
        Some(path) => DatabaseConfig::new(path),
        None => DatabaseConfig::default(),
    };

    if cli.verbose {
        tracing::info!(
            agent = %config.agent.executable,
            db = %db_config.path.display(),
            "Configuration loaded"
        );
    }

    let db = Database::connect(db_config).await?;
    db.migrate().await?;

    let engine = ReviewEngine::new(
        &db,
        config.clone(),
        Arc::new(CommandBackend::new(config.agent.clone())),
        Arc::new(LogNotifier),
    );
    let _result_loop = engine.start();
    engine.recover_active_reviews().await?;

    let outcome = match cli.command {
        Commands::Create(args) => args.execute(&engine).await,
        Commands::List(args) => args.execute(&engine).await,
        Commands::Show(args) => args.execute(&engine).await,
        Commands::Resubmit(args) => args.execute(&engine).await,
        Commands::Cancel(args) => args.execute(&engine).await,
        Commands::Delete(args) => args.execute(&engine).await,
        Commands::Issues(args) => args.execute(&engine).await,
    };

    engine.shutdown().await;
    outcome
}
