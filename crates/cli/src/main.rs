//! OfficeClaw CLI: the main entry point.
//!
//! Commands:
//! - `run`: Run a task list with a worker pool
//! - `task`: Run a single instruction end to end
//! - `config`: Show the effective (redacted) or default configuration
//! - `models`: List allowed models and aliases

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "officeclaw",
    about = "OfficeClaw — autonomous business-task agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task in a task file
    Run {
        /// JSON task list: [{"task_id", "spec_id", "text"}, ...]
        #[arg(long)]
        tasks: PathBuf,

        /// Only run these tasks (1-based index, task id, or spec id)
        #[arg(short = 't', long = "task")]
        select: Vec<String>,

        /// Model id or alias
        #[arg(short, long)]
        model: Option<String>,

        /// Parallel workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Run one task at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Run a single instruction
    Task {
        instruction: String,

        /// Model id or alias
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show configuration
    Config {
        /// Print the built-in defaults instead of the effective config
        #[arg(long)]
        default: bool,
    },

    /// List allowed models
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            tasks,
            select,
            model,
            workers,
            sequential,
        } => {
            commands::run::run(commands::run::RunArgs {
                tasks,
                select,
                model,
                workers,
                sequential,
            })
            .await?
        }
        Commands::Task { instruction, model } => commands::task::run(instruction, model).await?,
        Commands::Config { default } => commands::config_cmd::show(default)?,
        Commands::Models => commands::models::run()?,
    }

    Ok(())
}
