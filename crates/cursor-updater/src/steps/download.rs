//! Download the artifact with streaming progress.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::blocking::Client;
use tempfile::NamedTempFile;

use crate::error::{Result, UpdateError};

/// User agent string for download requests.
const USER_AGENT_VALUE: &str = concat!("update-cursor/", env!("CARGO_PKG_VERSION"));

/// Size of each chunk copied from the network into the scratch file.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Download progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Declared size of the artifact, when the server sent one.
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Returns the progress as a fraction (0.0 to 1.0), if the size is known.
    #[must_use]
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded as f64 / total as f64).min(1.0) as f32),
        }
    }

    /// Returns the progress as a percentage (0 to 100), if the size is known.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.fraction().map(|f| (f * 100.0).min(100.0) as u8)
    }
}

/// Receives download progress.
pub trait ProgressReporter {
    /// Called once the response headers are in.
    fn on_start(&self, total: Option<u64>);

    /// Called after each chunk is written.
    fn on_progress(&self, progress: &DownloadProgress);

    /// Called after the last chunk, or when the download is abandoned.
    fn on_finish(&self);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_start(&self, _total: Option<u64>) {}
    fn on_progress(&self, _progress: &DownloadProgress) {}
    fn on_finish(&self) {}
}

/// An open artifact body.
pub struct ArtifactStream {
    /// Declared `Content-Length`.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: Box<dyn Read>,
}

impl std::fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens artifact URLs for reading.
pub trait ArtifactSource {
    /// Starts a request for `url`. Non-success responses are errors.
    fn open(&self, url: &str) -> Result<ArtifactStream>;
}

/// Artifact source backed by a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Creates an HTTP source with the updater's user agent.
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT_VALUE).build()?;
        Ok(Self { client })
    }
}

impl ArtifactSource for HttpSource {
    fn open(&self, url: &str) -> Result<ArtifactStream> {
        tracing::info!("Starting download from {}", url);

        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::DownloadFailed(format!(
                "download failed with status {}",
                status
            )));
        }

        Ok(ArtifactStream {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

/// Streams `url` into a fresh scratch file in `scratch_dir`.
///
/// The cancel flag is polled between chunks. On any error the scratch file
/// is removed when the returned handle would have been dropped, so a partial
/// artifact is never left behind.
pub fn download_to_scratch(
    source: &dyn ArtifactSource,
    url: &str,
    scratch_dir: &Path,
    reporter: &dyn ProgressReporter,
    cancel: &AtomicBool,
) -> Result<NamedTempFile> {
    if cancel.load(Ordering::SeqCst) {
        return Err(UpdateError::Cancelled);
    }

    let mut stream = source.open(url)?;
    let mut scratch = tempfile::Builder::new()
        .prefix("cursor-")
        .suffix(".AppImage")
        .tempfile_in(scratch_dir)
        .map_err(|e| {
            UpdateError::DownloadFailed(format!(
                "failed to create scratch file in {}: {}",
                scratch_dir.display(),
                e
            ))
        })?;
    tracing::debug!("Scratch file: {}", scratch.path().display());

    reporter.on_start(stream.content_length);
    let result = copy_chunks(&mut stream, scratch.as_file_mut(), reporter, cancel);
    reporter.on_finish();

    let downloaded = result?;
    tracing::info!("Download complete: {}", format_bytes(downloaded));
    Ok(scratch)
}

fn copy_chunks(
    stream: &mut ArtifactStream,
    out: &mut impl Write,
    reporter: &dyn ProgressReporter,
    cancel: &AtomicBool,
) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut progress = DownloadProgress {
        downloaded: 0,
        total: stream.content_length,
    };

    loop {
        if cancel.load(Ordering::SeqCst) {
            tracing::warn!("Download interrupted after {}", format_bytes(progress.downloaded));
            return Err(UpdateError::Cancelled);
        }

        let n = match stream.body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UpdateError::DownloadFailed(e.to_string())),
        };

        out.write_all(&buf[..n])
            .map_err(|e| UpdateError::DownloadFailed(format!("failed to write scratch file: {}", e)))?;

        progress.downloaded += n as u64;
        reporter.on_progress(&progress);
    }

    out.flush()
        .map_err(|e| UpdateError::DownloadFailed(format!("failed to flush scratch file: {}", e)))?;

    if let Some(total) = progress.total
        && progress.downloaded < total
    {
        return Err(UpdateError::DownloadFailed(format!(
            "connection closed after {} of {}",
            format_bytes(progress.downloaded),
            format_bytes(total)
        )));
    }

    Ok(progress.downloaded)
}

/// Format bytes as a human-readable string.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
