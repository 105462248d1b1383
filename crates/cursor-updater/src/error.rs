//! Error types for the update pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during an update run.
///
/// Most variants abort the run (see [`UpdateError::is_fatal`]). Desktop
/// integration and version record failures are recorded and the run
/// continues, since the application itself is already installed by then.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// Failed to parse version string.
    #[error("invalid version format: {0}")]
    InvalidVersion(String),

    /// The updater configuration file could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external fetcher or its runtime could not be found.
    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    /// The external fetcher exited unsuccessfully or left no manifest behind.
    #[error("external fetcher failed: {0}")]
    ExternalFetchFailed(String),

    /// The version manifest could not be read or parsed.
    #[error("version manifest {path} is unreadable: {reason}")]
    ManifestUnreadable {
        /// Manifest file location.
        path: PathBuf,
        /// Underlying I/O or JSON error.
        reason: String,
    },

    /// The version manifest contained no parsable version entry.
    #[error("no valid versions found in version manifest")]
    ManifestEmpty,

    /// The latest release has no artifact for this platform.
    #[error("no download available for platform: {0}")]
    PlatformUnsupported(String),

    /// Network or scratch-file failure while downloading the artifact.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// Could not place the artifact at the install path.
    #[error("failed to install to {path}: {reason}")]
    InstallWriteFailed {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying error.
        reason: String,
    },

    /// The run was interrupted by the user.
    #[error("update cancelled by user")]
    Cancelled,

    /// The desktop launcher file could not be created or patched.
    #[error("failed to update desktop file {path}: {reason}")]
    DesktopIntegrationFailed {
        /// Launcher file location.
        path: PathBuf,
        /// Underlying error.
        reason: String,
    },

    /// A version record file could not be written.
    #[error("failed to write version record {path}: {reason}")]
    VersionRecordWriteFailed {
        /// Version record location.
        path: PathBuf,
        /// Underlying error.
        reason: String,
    },
}

impl UpdateError {
    /// Returns whether this error terminates the run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DesktopIntegrationFailed { .. }
                | Self::VersionRecordWriteFailed { .. }
                | Self::InvalidVersion(_)
        )
    }

    /// Returns a user-friendly message for the terminal summary.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidConfig(_) => "The updater configuration file is invalid.",
            Self::PrerequisiteMissing(_) => {
                "Cannot proceed due to missing prerequisites. Please install Bun and try again."
            }
            Self::ExternalFetchFailed(_) => "Could not refresh the list of available versions.",
            Self::ManifestUnreadable { .. } => "The version history file could not be read.",
            Self::ManifestEmpty => "No valid versions found in version history.",
            Self::PlatformUnsupported(_) => "No download is available for this platform.",
            Self::DownloadFailed(_) => {
                "Could not download the update. Please check your internet connection."
            }
            Self::InstallWriteFailed { .. } => {
                "Could not install the update. Check permissions on the install location."
            }
            Self::Cancelled => "Update cancelled by user.",
            Self::DesktopIntegrationFailed { .. } => "Could not update the desktop launcher.",
            Self::VersionRecordWriteFailed { .. } => "Could not record the installed version.",
            Self::InvalidVersion(_) => "An unexpected error occurred.",
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        Self::DownloadFailed(err.to_string())
    }
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
