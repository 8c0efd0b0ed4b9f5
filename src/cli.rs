//! CLI definitions for AutoForms.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// AutoForms CLI.
#[derive(Parser)]
#[command(name = "autoforms")]
#[command(about = "Replay-first UI workflow automation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the URL pattern and detected platform for a URL
    Pattern {
        url: String,
    },

    /// Manual management commands
    Manual {
        #[command(subcommand)]
        action: ManualAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ManualAction {
    /// Import a JSON array of steps as a new manual
    Import {
        /// Path to the steps file
        file: PathBuf,

        /// Sample URL the manual applies to
        #[arg(long)]
        url: String,

        /// Task the manual performs
        #[arg(long)]
        task: String,

        /// Platform tag (detected from the URL when omitted)
        #[arg(long)]
        platform: Option<String>,
    },

    /// List healthy manuals for a task
    List {
        #[arg(long)]
        task: String,

        #[arg(long)]
        platform: Option<String>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show one manual as JSON
    Show {
        id: String,
    },

    /// Find the manual that would replay for a URL
    Match {
        url: String,

        #[arg(long)]
        task: String,

        #[arg(long)]
        platform: Option<String>,
    },

    /// Record a replay outcome
    Outcome {
        id: String,

        #[arg(value_enum)]
        outcome: OutcomeArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum OutcomeArg {
    Success,
    Failure,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Validate the configuration file
    Validate,

    /// Print the effective configuration as TOML
    Show,
}
