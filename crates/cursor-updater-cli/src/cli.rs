//! CLI argument definitions for the updater.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

/// Bare token accepted in place of `--no-progress-bar`.
const LEGACY_NO_PROGRESS: &str = "no-progress-bar";

#[derive(Parser)]
#[command(
    name = "update-cursor",
    version,
    about = "Install or update the Cursor editor AppImage",
    long_about = "Install or update the Cursor editor AppImage.\n\n\
                  Run with sudo to install system-wide to /usr/local/bin.\n\
                  Without sudo, Cursor is installed to ~/.local/bin for the current user."
)]
pub struct Cli {
    /// Do not show the download progress bar.
    #[arg(long = "no-progress-bar")]
    pub no_progress_bar: bool,

    /// Load updater settings from a JSON file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory containing the version fetcher (overrides UPDATE_CURSOR_FETCHER_DIR).
    #[arg(long = "fetcher-dir", value_name = "DIR")]
    pub fetcher_dir: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "compact")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses process arguments, accepting the bare `no-progress-bar` token.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrites the legacy bare `no-progress-bar` token into its flag form.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index > 0 && arg == LEGACY_NO_PROGRESS {
                OsString::from("--no-progress-bar")
            } else {
                arg
            }
        })
        .collect()
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
