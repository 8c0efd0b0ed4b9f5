//! AutoForms - replay-first UI workflow automation.
//!
//! Main entry point for the AutoForms CLI.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use autoforms_config::{Config, ConfigLoader, LoggingConfig};
use autoforms_cookbook::{detect_platform, url_to_pattern};

mod cli;
mod cmd_config;
mod cmd_manual;

use cli::{Cli, Commands};
use cmd_config::handle_config_command;
use cmd_manual::handle_manual_command;

/// Initialize tracing with console and optional file output.
///
/// Log files rotate daily under `logging.directory` when it is set.
fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = if config.format == "json" {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match &config.directory {
        Some(dir) => {
            let dir = PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy()));
            std::fs::create_dir_all(&dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("autoforms")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Held for the process lifetime so buffered lines are flushed.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(ConfigLoader::load_or_default(path)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;
    debug!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Pattern { url } => {
            println!("pattern:  {}", url_to_pattern(&url));
            println!("platform: {}", detect_platform(&url).unwrap_or("-"));
            Ok(())
        }
        Commands::Manual { action } => handle_manual_command(action, &config).await,
        Commands::Config { action } => handle_config_command(action, &config),
    }
}
