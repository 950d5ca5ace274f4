//! Draftsmith CLI — the main entry point.
//!
//! Commands:
//! - `refine` — Run the full refinement + formatting pipeline on a draft
//! - `check`  — Score an already-formatted document offline
//! - `config` — Show or initialize the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "draftsmith",
    about = "Draftsmith — LLM-assisted blog formatting pipeline",
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
    /// Refine and format a markdown draft
    Refine {
        /// Path to the draft markdown file
        input: PathBuf,

        /// Where to write the formatted draft (defaults to <input>.formatted.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Write the full result (summary, titles, history) as JSON here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Score a formatted document against the rubric, no LLM calls
    Check {
        /// Path to the formatted markdown file
        input: PathBuf,

        /// Baseline file for content/LaTeX preservation checks
        #[arg(short, long)]
        baseline: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Refine {
            input,
            output,
            model,
            report,
        } => commands::refine::run(input, output, model, report).await?,
        Commands::Check { input, baseline } => commands::check::run(input, baseline)?,
        Commands::Config { init } => commands::config_cmd::run(init)?,
    }

    Ok(())
}
