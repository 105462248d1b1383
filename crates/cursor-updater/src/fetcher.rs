//! External manifest fetcher.
//!
//! Retrieving release metadata is delegated to a script run by a separate
//! runtime. This module only locates the pieces, runs the script and checks
//! that a manifest was left behind.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::FetcherConfig;
use crate::error::{Result, UpdateError};

/// Environment variable that overrides the fetcher root.
pub const FETCHER_DIR_VAR: &str = "UPDATE_CURSOR_FETCHER_DIR";

/// Source of a fresh version manifest.
pub trait ManifestFetcher {
    /// Checks that everything needed to refresh the manifest is present.
    fn preflight(&self) -> Result<()>;

    /// Refreshes the manifest and returns its location.
    fn refresh(&self) -> Result<PathBuf>;
}

/// Fetcher root and runtime found by a preflight probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherSetup {
    /// Directory containing the fetcher script.
    pub root: PathBuf,
    /// Runtime executable used to run the script.
    pub runtime: PathBuf,
}

/// Runs the fetcher script as a child process.
#[derive(Debug, Clone)]
pub struct ExternalFetcher {
    config: FetcherConfig,
    roots: Vec<PathBuf>,
    home: Option<PathBuf>,
    run_as: Option<String>,
}

impl ExternalFetcher {
    /// Creates a fetcher that searches `roots` in order.
    ///
    /// `run_as` names the user to drop to when the process is elevated.
    #[must_use]
    pub fn new(
        config: FetcherConfig,
        roots: Vec<PathBuf>,
        home: Option<PathBuf>,
        run_as: Option<String>,
    ) -> Self {
        Self {
            config,
            roots,
            home,
            run_as,
        }
    }

    /// Locates the fetcher root and runtime.
    pub fn locate(&self) -> Result<FetcherSetup> {
        let root = self
            .roots
            .iter()
            .find(|root| root.join(&self.config.script).is_file())
            .cloned()
            .ok_or_else(|| {
                let searched = self
                    .roots
                    .iter()
                    .map(|r| r.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                UpdateError::PrerequisiteMissing(format!(
                    "fetcher script {} not found in: {}",
                    self.config.script.display(),
                    searched
                ))
            })?;
        tracing::debug!("Fetcher root: {}", root.display());

        let runtime = self.find_runtime()?;
        tracing::debug!("Fetcher runtime: {}", runtime.display());

        Ok(FetcherSetup { root, runtime })
    }

    fn find_runtime(&self) -> Result<PathBuf> {
        if let Some(home) = &self.home {
            let candidate = home.join(&self.config.runtime_home_path);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        which::which(&self.config.runtime).map_err(|_| {
            UpdateError::PrerequisiteMissing(format!(
                "{} runtime not found in home or on PATH",
                self.config.runtime
            ))
        })
    }

    fn command(&self, setup: &FetcherSetup) -> Command {
        let mut command = match &self.run_as {
            Some(user) => {
                let mut sudo = Command::new("sudo");
                sudo.arg("-u").arg(user).arg(&setup.runtime);
                sudo
            }
            None => Command::new(&setup.runtime),
        };
        command.arg(&self.config.script).current_dir(&setup.root);
        command
    }
}

impl ManifestFetcher for ExternalFetcher {
    fn preflight(&self) -> Result<()> {
        let setup = self.locate()?;
        tracing::info!(
            "Found fetcher at {} (runtime {})",
            setup.root.display(),
            setup.runtime.display()
        );
        Ok(())
    }

    fn refresh(&self) -> Result<PathBuf> {
        let setup = self.locate()?;
        tracing::info!("Fetching latest version information");

        let output = self.command(&setup).output().map_err(|e| {
            UpdateError::ExternalFetchFailed(format!(
                "failed to start {}: {}",
                setup.runtime.display(),
                e
            ))
        })?;

        if !output.status.success() {
            log_output(&output, tracing::Level::WARN);
            return Err(UpdateError::ExternalFetchFailed(format!(
                "fetcher exited with {}",
                output.status
            )));
        }
        log_output(&output, tracing::Level::DEBUG);

        let manifest = setup.root.join(&self.config.manifest);
        if !manifest.is_file() {
            return Err(UpdateError::ExternalFetchFailed(format!(
                "fetcher succeeded but {} is missing",
                manifest.display()
            )));
        }

        Ok(manifest)
    }
}

fn log_output(output: &Output, level: tracing::Level) {
    let streams = [("stdout", &output.stdout), ("stderr", &output.stderr)];
    for (name, bytes) in streams {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if level == tracing::Level::WARN {
            tracing::warn!("Fetcher {}: {}", name, text);
        } else {
            tracing::debug!("Fetcher {}: {}", name, text);
        }
    }
}

/// Candidate fetcher roots in search order: explicit override, working
/// directory, well-known install directory.
#[must_use]
pub fn candidate_roots(
    override_dir: Option<&Path>,
    cwd: Option<&Path>,
    install_dir: &Path,
) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::with_capacity(3);
    for root in [override_dir, cwd, Some(install_dir)].into_iter().flatten() {
        if !roots.iter().any(|r| r == root) {
            roots.push(root.to_path_buf());
        }
    }
    roots
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        home: PathBuf,
    }

    /// Lays out a fetcher root whose script body is shell, plus a home with
    /// a runtime at the per-user location.
    fn fixture(script_body: &str) -> Fixture {
        let dir = tempdir().unwrap();
        let root = dir.path().join("update-cursor");
        let home = dir.path().join("home");

        fs::create_dir_all(root.join("updater")).unwrap();
        fs::write(root.join("updater/fetch_updates.ts"), script_body).unwrap();

        let runtime = home.join(".bun/bin/bun");
        fs::create_dir_all(runtime.parent().unwrap()).unwrap();
        fs::write(&runtime, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&runtime, fs::Permissions::from_mode(0o755)).unwrap();

        Fixture {
            _dir: dir,
            root,
            home,
        }
    }

    fn fetcher(fx: &Fixture) -> ExternalFetcher {
        ExternalFetcher::new(
            FetcherConfig::default(),
            vec![fx.root.clone()],
            Some(fx.home.clone()),
            None,
        )
    }

    /// Runs the fixture script with `sh` from `PATH`.
    fn shell_fetcher(fx: &Fixture) -> ExternalFetcher {
        let config = FetcherConfig {
            runtime: "sh".to_string(),
            runtime_home_path: PathBuf::from(".nowhere/sh"),
            ..FetcherConfig::default()
        };
        ExternalFetcher::new(config, vec![fx.root.clone()], Some(fx.home.clone()), None)
    }

    #[test]
    fn test_candidate_roots_order_and_dedup() {
        let roots = candidate_roots(
            Some(Path::new("/srv/fetcher")),
            Some(Path::new("/opt/update-cursor")),
            Path::new("/opt/update-cursor"),
        );
        assert_eq!(
            roots,
            vec![PathBuf::from("/srv/fetcher"), PathBuf::from("/opt/update-cursor")]
        );
    }

    #[test]
    fn test_preflight_finds_home_runtime() {
        let fx = fixture("exit 0");
        let setup = fetcher(&fx).locate().unwrap();
        assert_eq!(setup.root, fx.root);
        assert_eq!(setup.runtime, fx.home.join(".bun/bin/bun"));
    }

    #[test]
    fn test_preflight_missing_script() {
        let fx = fixture("exit 0");
        let missing = ExternalFetcher::new(
            FetcherConfig::default(),
            vec![fx.home.clone()],
            Some(fx.home.clone()),
            None,
        );
        assert!(matches!(
            missing.preflight(),
            Err(UpdateError::PrerequisiteMissing(_))
        ));
    }

    #[test]
    fn test_preflight_missing_runtime() {
        let fx = fixture("exit 0");
        let config = FetcherConfig {
            runtime: "update-cursor-test-no-such-runtime".to_string(),
            runtime_home_path: PathBuf::from(".nowhere/runtime"),
            ..FetcherConfig::default()
        };
        let fetcher = ExternalFetcher::new(config, vec![fx.root.clone()], Some(fx.home.clone()), None);
        assert!(matches!(
            fetcher.preflight(),
            Err(UpdateError::PrerequisiteMissing(_))
        ));
    }

    #[test]
    fn test_elevated_command_drops_to_invoking_user() {
        let fx = fixture("exit 0");
        let fetcher = ExternalFetcher::new(
            FetcherConfig::default(),
            vec![fx.root.clone()],
            Some(fx.home.clone()),
            Some("alice".to_string()),
        );
        let setup = fetcher.locate().unwrap();
        let command = fetcher.command(&setup);

        assert_eq!(command.get_program(), "sudo");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(
            args,
            [
                std::ffi::OsStr::new("-u"),
                std::ffi::OsStr::new("alice"),
                fx.home.join(".bun/bin/bun").as_os_str(),
                std::ffi::OsStr::new("updater/fetch_updates.ts"),
            ]
        );
        assert_eq!(command.get_current_dir(), Some(fx.root.as_path()));
    }

    #[test]
    fn test_unelevated_command_runs_directly() {
        let fx = fixture("exit 0");
        let fetcher = fetcher(&fx);
        let command = fetcher.command(&fetcher.locate().unwrap());

        assert_eq!(command.get_program(), fx.home.join(".bun/bin/bun").as_os_str());
        assert_eq!(
            command.get_args().collect::<Vec<_>>(),
            [std::ffi::OsStr::new("updater/fetch_updates.ts")]
        );
    }

    #[test]
    fn test_refresh_returns_manifest() {
        let fx = fixture(r#"mkdir -p data && echo '{"versions":[]}' > data/version-history.json"#);
        let manifest = shell_fetcher(&fx).refresh().unwrap();
        assert_eq!(manifest, fx.root.join("data/version-history.json"));
    }

    #[test]
    fn test_refresh_nonzero_exit() {
        let fx = fixture("echo 'rate limited' >&2; exit 3");
        assert!(matches!(
            shell_fetcher(&fx).refresh(),
            Err(UpdateError::ExternalFetchFailed(_))
        ));
    }

    #[test]
    fn test_refresh_without_manifest() {
        let fx = fixture("exit 0");
        match shell_fetcher(&fx).refresh() {
            Err(UpdateError::ExternalFetchFailed(reason)) => {
                assert!(reason.contains("version-history.json"));
            }
            other => panic!("expected ExternalFetchFailed, got {other:?}"),
        }
    }
}
