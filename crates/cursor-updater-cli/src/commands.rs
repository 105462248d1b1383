//! The update command.

use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use cursor_updater::{
    HttpSource, InstallMode, Installer, NoProgress, Outcome, ProgressReporter, RunContext,
    RunReport, UpdaterConfig,
};
use cursor_updater_cli::progress::BarReporter;
use cursor_updater_cli::summary::path_hint;

use crate::cli::Cli;

/// Loads the configuration named on the command line, or the default profile.
pub fn load_config(cli: &Cli) -> Result<UpdaterConfig> {
    match &cli.config {
        Some(path) => UpdaterConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(UpdaterConfig::default()),
    }
}

/// Runs one update and returns its report.
pub fn run_update(cli: &Cli, config: UpdaterConfig, cancel: &AtomicBool) -> Result<RunReport> {
    let context = RunContext::detect(&config).context("failed to resolve install environment")?;

    if context.mode == InstallMode::UserLocal {
        println!(
            "Running without sudo: {} will be installed to {}.",
            config.app_name,
            context.install_paths.user.display()
        );
        println!("For a system-wide installation, run with sudo.");
        println!();
    }

    let existing = context.install_paths.existing();
    if existing.is_empty() {
        println!("No existing {} installation found.", config.app_name);
    } else {
        println!("Existing {} installations:", config.app_name);
        for (mode, path) in existing {
            println!("  - {mode}: {}", path.display());
        }
    }
    println!();

    let fetcher = context.external_fetcher(&config, cli.fetcher_dir.clone());
    let source = HttpSource::new().context("failed to create HTTP client")?;
    let reporter: Box<dyn ProgressReporter> = if cli.no_progress_bar {
        Box::new(NoProgress)
    } else {
        Box::new(BarReporter::new())
    };

    let mode = context.mode;
    let user_bin_dir = context.home.join(&config.user_bin_dir);
    let installer = Installer::new(config, context, fetcher, source);
    let report = installer.run(reporter.as_ref(), cancel);

    if matches!(report.outcome, Outcome::Installed { .. })
        && let Some(hint) = path_hint(mode, &user_bin_dir)
    {
        println!("{hint}");
    }

    Ok(report)
}
