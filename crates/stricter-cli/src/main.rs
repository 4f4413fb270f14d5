//! stricter CLI tool.
//!
//! Usage:
//! ```bash
//! stricter [--config PATH] [--rule-name NAME]... [--clear-cache] [--fix] [--format text|json]
//! stricter list-rules
//! stricter init
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Dependency graph linter for JavaScript and TypeScript projects
#[derive(Parser)]
#[command(name = "stricter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options of a lint run.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Only run the named rule (repeatable)
    #[arg(long = "rule-name", value_name = "NAME")]
    pub rule_names: Vec<String>,

    /// Empty the resolution cache before running
    #[arg(long)]
    pub clear_cache: bool,

    /// Apply fixes provided by rules
    #[arg(long)]
    pub fix: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered rules
    ListRules,

    /// Write a starter configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Reporter lines on stdout.
    #[default]
    Text,
    /// The run outcome as JSON.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir()?;
    match cli.command {
        None => {
            let failed = commands::check::run(&cwd, cli.config.as_deref(), &cli.check)?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::ListRules) => commands::list_rules::run(&cwd, cli.config.as_deref()),
        Some(Commands::Init { force }) => commands::init::run(&cwd, force),
    }
}
