//! Cursor AppImage updater CLI.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::ColorChoice;
use cursor_updater::OperationTally;
use cursor_updater_cli::logging::{LogConfig, LogFormat, init_logging};
use cursor_updater_cli::summary::{print_report, print_tally};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};
use crate::commands::{load_config, run_update};

fn main() {
    let cli = Cli::parse_args();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    if let Err(error) = register_interrupts(&cancel) {
        tracing::warn!("Could not install interrupt handler: {}", error);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            print_tally(&OperationTally::default(), None);
            std::process::exit(1);
        }
    };
    let app_name = config.app_name.clone();

    let exit_code = match run_update(&cli, config, &cancel) {
        Ok(report) => {
            print_report(&report, &app_name);
            report.exit_code()
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            print_tally(&OperationTally::default(), None);
            1
        }
    };
    std::process::exit(exit_code);
}

/// Routes SIGINT and SIGTERM to the cancel flag polled by the download.
fn register_interrupts(cancel: &Arc<AtomicBool>) -> io::Result<()> {
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(cancel))?;
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_timestamps = cli.log_file.is_some();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_log_file_gets_timestamps() {
        let cli = Cli::try_parse_from(["update-cursor"]).unwrap();
        assert!(!log_config_from_cli(&cli).with_timestamps);

        let cli = Cli::try_parse_from(["update-cursor", "--log-file", "/tmp/update-cursor.log"])
            .unwrap();
        let config = log_config_from_cli(&cli);
        assert!(config.with_timestamps);
        assert!(!config.with_ansi);
    }

    #[test]
    fn test_explicit_level_disables_env_filter() {
        let cli = Cli::try_parse_from(["update-cursor", "--log-level", "debug"]).unwrap();
        let config = log_config_from_cli(&cli);
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }
}
