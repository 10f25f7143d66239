//! Whole-file line reads with bounded retry on lock contention.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ReadError;
use crate::telemetry::metrics;

/// OS error codes that mean "someone else holds the file right now".
#[cfg(windows)]
const LOCK_ERROR_CODES: &[i32] = &[32, 33]; // sharing / lock violation
#[cfg(not(windows))]
const LOCK_ERROR_CODES: &[i32] = &[16]; // EBUSY

/// Produces the current lines of a file.
pub trait LineSource: Send + Sync + 'static {
    /// Read the full file as lines, without line terminators.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Reads text files from disk.
///
/// Invalid UTF-8 sequences decode to U+FFFD. Content with NUL bytes is
/// treated as binary and refused with [`io::ErrorKind::InvalidData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLineSource;

impl LineSource for FsLineSource {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let bytes = std::fs::read(path)?;
        if bytes.contains(&0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "binary content (NUL byte)",
            ));
        }
        Ok(split_lines(&String::from_utf8_lossy(&bytes)))
    }
}

/// Split text into lines, dropping a leading BOM.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. A terminator at the very
/// end does not start another, empty line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    let mut rest = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = Vec::new();
    while let Some(at) = rest.find(['\r', '\n']) {
        lines.push(rest[..at].to_owned());
        let width = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[at + width..];
    }
    if !rest.is_empty() {
        lines.push(rest.to_owned());
    }
    lines
}

/// Whether an I/O error is worth retrying.
#[must_use]
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    ) || err
        .raw_os_error()
        .is_some_and(|code| LOCK_ERROR_CODES.contains(&code))
}

/// Reader that retries transient failures a fixed number of times.
#[derive(Clone)]
pub struct RetryingReader {
    source: Arc<dyn LineSource>,
    attempts: u32,
    delay: Duration,
}

impl fmt::Debug for RetryingReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingReader")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl RetryingReader {
    /// Reader over the real file system.
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self::with_source(Arc::new(FsLineSource), attempts, delay)
    }

    /// Reader over a custom line source.
    #[must_use]
    pub fn with_source(source: Arc<dyn LineSource>, attempts: u32, delay: Duration) -> Self {
        Self {
            source,
            attempts: attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Read `path`, retrying while it is locked.
    ///
    /// The delay between attempts only suspends the calling task.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Transient`] once every attempt failed on a lock,
    /// or [`ReadError::Permanent`] immediately for any other failure.
    pub async fn read(&self, path: &Path) -> Result<Vec<String>, ReadError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.read_once(path).await {
                Ok(lines) => return Ok(lines),
                Err(e) if is_transient(&e) => {
                    if attempt >= self.attempts {
                        return Err(ReadError::Transient {
                            path: path.display().to_string(),
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    tracing::debug!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "File busy, retrying"
                    );
                    metrics::READ_RETRIES.inc();
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    return Err(ReadError::Permanent {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn read_once(&self, path: &Path) -> io::Result<Vec<String>> {
        let source = Arc::clone(&self.source);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || source.read_lines(&path))
            .await
            .map_err(io::Error::other)?
    }
}
