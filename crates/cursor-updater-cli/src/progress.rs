//! Terminal rendering of download progress.

use std::time::Duration;

use cursor_updater::{DownloadProgress, ProgressReporter};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {bytes_per_sec}";

/// Download progress bar on stderr.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    /// Creates a bar that stays hidden until the download starts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarReporter {
    fn on_start(&self, total: Option<u64>) {
        let style = match total {
            Some(total) => {
                self.bar.set_length(total);
                ProgressStyle::with_template(BAR_TEMPLATE)
            }
            None => ProgressStyle::with_template(SPINNER_TEMPLATE),
        };
        match style {
            Ok(style) => self.bar.set_style(style.progress_chars("=> ")),
            Err(e) => tracing::debug!("Invalid progress template: {}", e),
        }
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        self.bar.set_position(progress.downloaded);
    }

    fn on_finish(&self) {
        self.bar.finish();
    }
}
