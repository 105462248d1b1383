//! Update orchestration.
//!
//! A run moves through a fixed sequence of steps:
//! 1. Preflight the external fetcher
//! 2. Refresh the version manifest
//! 3. Resolve the latest release
//! 4. Compare with the recorded version (stop here when up to date)
//! 5. Resolve the artifact URL for this platform
//! 6. Download to a scratch file
//! 7. Move the artifact to the install path
//! 8. Point the desktop launcher at it
//! 9. Record the installed version
//!
//! Steps 1 to 7 abort the run on failure. Steps 8 and 9 are recorded as
//! failed operations and the run still counts as an install. The cancel flag
//! is checked before every step, so an interrupt between steps aborts too.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::UpdaterConfig;
use crate::context::RunContext;
use crate::desktop;
use crate::error::{Result, UpdateError};
use crate::fetcher::ManifestFetcher;
use crate::locator::{self, ConflictReason};
use crate::manifest::{self, VersionManifest};
use crate::steps::download::{self, ArtifactSource, ProgressReporter};
use crate::steps::install;
use crate::version;

/// Counts of operations that succeeded and failed during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationTally {
    /// Operations that completed.
    pub succeeded: u32,
    /// Operations that failed, fatal or not.
    pub failed: u32,
}

impl OperationTally {
    /// Total number of recorded operations.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.succeeded + self.failed
    }

    /// Percentage of operations that succeeded, or `None` if nothing ran.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(f64::from(self.succeeded) / f64::from(total) * 100.0)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The recorded version is already the latest.
    UpToDate {
        /// Latest available version.
        version: String,
    },
    /// A new version was installed.
    Installed {
        /// Installed version.
        version: String,
        /// Where it was installed.
        path: PathBuf,
    },
    /// A fatal error stopped the run.
    Failed(UpdateError),
}

impl Outcome {
    /// Whether the run reached its goal.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: Outcome,
    /// Operation counts, including on abort.
    pub tally: OperationTally,
    /// Install layout conflicts found at start.
    pub conflicts: Vec<ConflictReason>,
    /// Non-fatal failures.
    pub warnings: Vec<UpdateError>,
}

impl RunReport {
    /// Process exit code for this report.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.outcome.is_success() { 0 } else { 1 }
    }
}

/// Tally and warnings accumulated while the steps run.
#[derive(Debug, Default)]
struct RunLog {
    tally: OperationTally,
    warnings: Vec<UpdateError>,
}

impl RunLog {
    /// Records a step whose failure aborts the run.
    fn fatal<T>(&mut self, step: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.tally.succeeded += 1;
                tracing::debug!("Step '{}' succeeded", step);
            }
            Err(e) => {
                self.tally.failed += 1;
                tracing::error!("Step '{}' failed: {}", step, e);
            }
        }
        result
    }

    /// Fails `step` with [`UpdateError::Cancelled`] once an interrupt arrived.
    fn checkpoint(&mut self, step: &str, cancel: &AtomicBool) -> Result<()> {
        if !cancel.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.tally.failed += 1;
        tracing::warn!("Interrupted before step '{}'", step);
        Err(UpdateError::Cancelled)
    }

    /// Records a step whose failure is reported but does not abort.
    fn non_fatal<T>(&mut self, step: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.tally.succeeded += 1;
                tracing::debug!("Step '{}' succeeded", step);
                Some(value)
            }
            Err(e) => {
                self.tally.failed += 1;
                tracing::warn!("Step '{}' failed: {}", step, e);
                self.warnings.push(e);
                None
            }
        }
    }
}

/// Runs the update pipeline for one configuration and context.
#[derive(Debug)]
pub struct Installer<F, S> {
    config: UpdaterConfig,
    context: RunContext,
    fetcher: F,
    source: S,
}

impl<F: ManifestFetcher, S: ArtifactSource> Installer<F, S> {
    /// Creates an installer.
    pub fn new(config: UpdaterConfig, context: RunContext, fetcher: F, source: S) -> Self {
        Self {
            config,
            context,
            fetcher,
            source,
        }
    }

    /// Runs all steps. Never panics on step failure; the outcome says how far
    /// the run got.
    pub fn run(&self, reporter: &dyn ProgressReporter, cancel: &AtomicBool) -> RunReport {
        tracing::info!(
            "Starting {} update ({} installation)",
            self.config.app_name,
            self.context.mode
        );

        let conflicts = locator::detect_conflicts(&self.context.install_paths, self.context.mode);
        let mut log = RunLog::default();

        let outcome = match self.execute(&mut log, reporter, cancel) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e),
        };

        match &outcome {
            Outcome::UpToDate { version } => {
                tracing::info!("{} is already up to date ({})", self.config.app_name, version);
            }
            Outcome::Installed { version, path } => {
                tracing::info!("Installed {} {} at {}", self.config.app_name, version, path.display());
            }
            Outcome::Failed(e) => tracing::error!("Update failed: {}", e),
        }

        RunReport {
            outcome,
            tally: log.tally,
            conflicts,
            warnings: log.warnings,
        }
    }

    fn execute(
        &self,
        log: &mut RunLog,
        reporter: &dyn ProgressReporter,
        cancel: &AtomicBool,
    ) -> Result<Outcome> {
        log.checkpoint("preflight", cancel)?;
        log.fatal("preflight", self.fetcher.preflight())?;

        log.checkpoint("refresh manifest", cancel)?;
        let refreshed = self.fetcher.refresh().map_err(|e| {
            // The fetcher child receives the same interrupt and dies with it.
            if cancel.load(Ordering::SeqCst) {
                UpdateError::Cancelled
            } else {
                e
            }
        });
        let manifest_path = log.fatal("refresh manifest", refreshed)?;

        log.checkpoint("resolve latest version", cancel)?;
        let latest = log.fatal(
            "resolve latest version",
            VersionManifest::load(&manifest_path).and_then(|m| manifest::select_latest(&m)),
        )?;
        let latest_version = latest.version.to_string();

        let current = self.context.version_store.read();
        let newer = version::is_newer(current.as_deref(), &latest_version);
        log.checkpoint("compare versions", cancel)?;
        if !newer {
            return Ok(Outcome::UpToDate {
                version: latest_version,
            });
        }
        match current.as_deref() {
            Some(current) => tracing::info!("Update available: {} -> {}", current, latest_version),
            None => tracing::info!("No recorded install, installing {}", latest_version),
        }

        let url = log.fatal(
            "resolve download URL",
            manifest::resolve_artifact_url(&latest.platforms, &self.config.platform_key),
        )?;

        log.checkpoint("download", cancel)?;
        let artifact = log.fatal(
            "download",
            download::download_to_scratch(
                &self.source,
                url,
                &self.context.scratch_dir,
                reporter,
                cancel,
            ),
        )?;

        log.checkpoint("install", cancel)?;
        let install_path = log.fatal(
            "install",
            install::install_artifact(artifact, self.context.install_path()),
        )?;

        log.checkpoint("desktop integration", cancel)?;
        let launcher = log.non_fatal(
            "desktop integration",
            desktop::reconcile(&self.context.launcher_path, &install_path, &self.config.launcher),
        );
        if let Some(action) = launcher {
            tracing::info!(
                "Desktop launcher {}: {}",
                action.label(),
                self.context.launcher_path.display()
            );
        }

        log.checkpoint("record version", cancel)?;
        let record = self.context.version_store.write(&latest_version);
        log.non_fatal("record version", record.primary);
        log.non_fatal("mirror version record", record.legacy);

        log.checkpoint("finish", cancel)?;
        Ok(Outcome::Installed {
            version: latest_version,
            path: install_path,
        })
    }
}
