//! Per-run environment, resolved once before the pipeline starts.

use std::path::{Path, PathBuf};

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::fetcher::{ExternalFetcher, FETCHER_DIR_VAR, candidate_roots};
use crate::locator::{self, InstallMode, InstallPaths};
use crate::version_store::VersionStore;

/// Everything the pipeline needs to know about where things live.
///
/// Components read paths from here instead of consulting the process
/// environment, so a run never changes its mind halfway through.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Install mode for this run.
    pub mode: InstallMode,
    /// Home of the user the install is for.
    pub home: PathBuf,
    /// Working directory at startup, if it could be determined.
    pub cwd: Option<PathBuf>,
    /// Non-elevated user behind an elevated run.
    pub invoking_user: Option<String>,
    /// Candidate install locations.
    pub install_paths: InstallPaths,
    /// Desktop launcher file.
    pub launcher_path: PathBuf,
    /// Version record locations.
    pub version_store: VersionStore,
    /// Directory for the download scratch file.
    pub scratch_dir: PathBuf,
}

impl RunContext {
    /// Probes the process environment.
    pub fn detect(config: &UpdaterConfig) -> Result<Self> {
        let elevated = locator::is_elevated();
        let mode = InstallMode::resolve(elevated);
        let invoking_user = if elevated { locator::invoking_user() } else { None };

        let home = locator::resolve_home(elevated, invoking_user.as_deref(), dirs::home_dir())
            .ok_or_else(|| {
                UpdateError::PrerequisiteMissing("cannot determine home directory".to_string())
            })?;
        let cwd = std::env::current_dir().ok();

        tracing::debug!(
            "Detected {} mode, home {}, invoking user {:?}",
            mode,
            home.display(),
            invoking_user
        );

        Ok(Self::from_parts(
            config,
            mode,
            home,
            cwd,
            invoking_user,
            std::env::temp_dir(),
        ))
    }

    /// Builds a context from already-resolved pieces.
    #[must_use]
    pub fn from_parts(
        config: &UpdaterConfig,
        mode: InstallMode,
        home: PathBuf,
        cwd: Option<PathBuf>,
        invoking_user: Option<String>,
        scratch_dir: PathBuf,
    ) -> Self {
        let install_paths = InstallPaths::new(config, &home);
        let launcher_path = home.join(&config.launcher_file);
        let fallback_base = cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        let version_store = VersionStore::new(
            config.primary_version_file.clone(),
            home.join(&config.legacy_version_file),
            fallback_base.join(&config.fallback_version_file),
        );

        Self {
            mode,
            home,
            cwd,
            invoking_user,
            install_paths,
            launcher_path,
            version_store,
            scratch_dir,
        }
    }

    /// Install path for this run's mode.
    #[must_use]
    pub fn install_path(&self) -> &Path {
        self.install_paths.for_mode(self.mode)
    }

    /// Builds the external fetcher for this run.
    ///
    /// `override_dir` takes precedence over [`FETCHER_DIR_VAR`]. The fetcher
    /// drops to the invoking user when the run is elevated.
    #[must_use]
    pub fn external_fetcher(
        &self,
        config: &UpdaterConfig,
        override_dir: Option<PathBuf>,
    ) -> ExternalFetcher {
        let override_dir = override_dir.or_else(|| {
            std::env::var_os(FETCHER_DIR_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });
        let roots = candidate_roots(
            override_dir.as_deref(),
            self.cwd.as_deref(),
            &config.fetcher.install_dir,
        );
        let run_as = if self.mode.is_elevated() {
            self.invoking_user.clone()
        } else {
            None
        };

        ExternalFetcher::new(config.fetcher.clone(), roots, Some(self.home.clone()), run_as)
    }
}
