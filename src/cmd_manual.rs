//! Manual subcommand handlers for AutoForms.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use autoforms_config::{Config, ConfigLoader, StorageConfig};
use autoforms_cookbook::health::is_replayable;
use autoforms_cookbook::{ManualMeta, ManualStore, MemoryManualRepository, detect_platform};
use autoforms_manual_sqlite::SqliteManualRepository;
use autoforms_protocols::storage::ManualRepository;
use autoforms_protocols::types::{ActionManual, ManualStep, Outcome};

use crate::cli::{ManualAction, OutcomeArg};

/// Handle manual subcommands.
pub(crate) async fn handle_manual_command(
    action: ManualAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config).await?;
    match action {
        ManualAction::Import {
            file,
            url,
            task,
            platform,
        } => manual_import(&store, &file, &url, &task, platform).await,
        ManualAction::List {
            task,
            platform,
            format,
        } => manual_list(&store, &task, platform.as_deref(), &format).await,
        ManualAction::Show { id } => manual_show(&store, &id).await,
        ManualAction::Match {
            url,
            task,
            platform,
        } => manual_match(&store, &url, &task, platform.as_deref()).await,
        ManualAction::Outcome { id, outcome } => manual_outcome(&store, &id, outcome).await,
    }
}

/// Build the store over the configured backend.
async fn open_store(config: &Config) -> Result<ManualStore, Box<dyn std::error::Error>> {
    let repo = open_repository(&config.storage).await?;
    Ok(ManualStore::new(repo, config.store.clone()))
}

async fn open_repository(
    storage: &StorageConfig,
) -> Result<Arc<dyn ManualRepository>, Box<dyn std::error::Error>> {
    match storage.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryManualRepository::new())),
        "sqlite" => {
            let path = PathBuf::from(ConfigLoader::expand_path(
                &storage.resolved_path().to_string_lossy(),
            ));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Arc::new(SqliteManualRepository::open(&path).await?))
        }
        other => Err(format!("Unknown storage backend: {}", other).into()),
    }
}

fn parse_id(id: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Uuid::parse_str(id).map_err(|e| format!("Invalid manual id '{}': {}", id, e).into())
}

async fn manual_import(
    store: &ManualStore,
    file: &Path,
    url: &str,
    task: &str,
    platform: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let steps: Vec<ManualStep> = serde_json::from_str(&content)?;
    let platform = platform.or_else(|| detect_platform(url).map(str::to_string));
    let meta = ManualMeta::for_url(url, task).with_platform(platform);

    let manual = store.save_from_action_book(steps, meta).await?;
    info!(manual_id = %manual.id, "Manual imported");
    println!("Imported manual {}", manual.id);
    println!("  pattern: {}", manual.url_pattern);
    println!("  steps:   {}", manual.steps.len());
    Ok(())
}

async fn manual_list(
    store: &ManualStore,
    task: &str,
    platform: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let manuals = store.list(task, platform).await?;

    if manuals.is_empty() {
        println!("No manuals found.");
        return Ok(());
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&manuals)?),
        _ => {
            println!("{:<38} {:<7} {:<14} {}", "ID", "HEALTH", "PLATFORM", "PATTERN");
            println!("{}", "-".repeat(90));
            for manual in manuals {
                print_row(&manual);
            }
        }
    }
    Ok(())
}

fn print_row(manual: &ActionManual) {
    println!(
        "{:<38} {:<7} {:<14} {}",
        manual.id,
        manual.health_score,
        manual.platform.as_deref().unwrap_or("-"),
        manual.url_pattern
    );
}

async fn manual_show(store: &ManualStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(id)?;
    match store.get(&id).await? {
        Some(manual) => {
            println!("{}", serde_json::to_string_pretty(&manual)?);
            Ok(())
        }
        None => Err(format!("Manual not found: {}", id).into()),
    }
}

async fn manual_match(
    store: &ManualStore,
    url: &str,
    task: &str,
    platform: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    match store.lookup(url, task, platform).await? {
        Some(manual) => {
            print_row(&manual);
            println!("replayable: {}", is_replayable(manual.health()));
        }
        None => println!("No manual matches {}", url),
    }
    Ok(())
}

async fn manual_outcome(
    store: &ManualStore,
    id: &str,
    outcome: OutcomeArg,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(id)?;
    let outcome = match outcome {
        OutcomeArg::Success => Outcome::Success,
        OutcomeArg::Failure => Outcome::Failure,
    };
    match store.record_outcome(&id, outcome).await? {
        Some(manual) => {
            println!(
                "health {} (successes {}, failures {})",
                manual.health_score, manual.success_count, manual.failure_count
            );
            Ok(())
        }
        None => Err(format!("Manual not found: {}", id).into()),
    }
}
