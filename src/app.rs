// Declare modules
pub mod archiver;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod interrupt;
pub mod models;
pub mod retention;
pub mod scanner;

use anyhow::{Context, Result};
use chrono::Local;
use std::env;
use std::fs;

use self::archiver::Archiver;
use self::cli::TargetArg;
use self::config::{ConfigStore, LoadedConfig};
use self::error::BackupError;
use self::formatter::OutputGenerator;
use self::interrupt::InFlight;
use self::models::{BackupConfig, BackupTarget, Settings};
use self::retention::RetentionManager;

/// Parses the command line and backs up every target in order.
///
/// Returns `Ok(false)` when at least one target failed.
pub fn run() -> Result<bool> {
    // 1. Parse Args (usage errors exit here, before any target runs)
    let invocation = cli::parse_from(env::args_os()).unwrap_or_else(|e| e.exit());

    // 2. Build run-wide settings
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let settings = Settings {
        backup_root: current_dir.join(&invocation.save),
        force: invocation.force,
        dateless: invocation.dateless,
        preview: invocation.preview,
        today: Local::now().date_naive(),
    };

    if !settings.preview {
        fs::create_dir_all(&settings.backup_root).with_context(|| {
            format!(
                "Failed to create backup directory {}",
                settings.backup_root.display()
            )
        })?;
    }

    let in_flight = InFlight::default();
    interrupt::install(in_flight.clone()).context("Failed to install Ctrl-C handler")?;

    if invocation.targets.is_empty() {
        log::warn!("💡 Tip: No targets given, use -f PATH or -n PATH NAME.");
        return Ok(true);
    }

    // 3. Process targets one at a time
    let mut all_ok = true;
    for request in &invocation.targets {
        all_ok &= run_target(request, &settings, &in_flight);
    }

    Ok(all_ok)
}

/// Resolves and backs up one target, logging its failure under the best known name.
fn run_target(request: &TargetArg, settings: &Settings, in_flight: &InFlight) -> bool {
    let (label, result) = match request.resolve() {
        Ok(target) => {
            let result = backup_target(&target, settings, in_flight);
            (target.display_name, result)
        }
        Err(err) => (request.label(), Err(err)),
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            log::error!("[{}] {} error: {}", label, err.kind(), err);
            false
        }
    }
}

/// Config load, archive and retention for a single target.
pub fn backup_target(
    target: &BackupTarget,
    settings: &Settings,
    in_flight: &InFlight,
) -> Result<(), BackupError> {
    let name = &target.display_name;

    let config = match resolve_target_config(name, settings)? {
        Some(config) => config,
        None => return Ok(()),
    };

    if let Some(report) = Archiver::new(settings, in_flight).archive(target, &config)? {
        log::info!("[{}] {}", name, OutputGenerator::format_summary(&report));
    }

    if settings.runs_retention(&config) {
        let mut manager = RetentionManager::new(&settings.backup_root, settings.preview);
        if settings.preview {
            manager = manager.with_pending(settings.today, settings.archive_path(name));
        }
        let deleted = manager.clean(name)?;
        if !settings.preview {
            log::info!("[{}] auto_clean removed {} archive(s)", name, deleted.len());
        }
    }

    Ok(())
}

/// `None` means the descriptor was just created and this run skips the target.
fn resolve_target_config(
    name: &str,
    settings: &Settings,
) -> Result<Option<BackupConfig>, BackupError> {
    if settings.force {
        return Ok(Some(BackupConfig::forced()));
    }

    let store = if settings.preview {
        ConfigStore::read_only(settings.cache_dir())
    } else {
        ConfigStore::new(settings.cache_dir())
    };

    let loaded = store.load(name)?;
    match &loaded {
        LoadedConfig::Created(_) => {
            log::info!(
                "[{}] {} not found, config file constructed, skip compression",
                name,
                store.path_for(name).display()
            );
            return Ok(None);
        }
        LoadedConfig::Defaulted(_) => log::info!(
            "[{}] {} not found, previewing with default filters",
            name,
            store.path_for(name).display()
        ),
        LoadedConfig::Existing(_) => {}
    }

    Ok(Some(loaded.config().clone()))
}
