//! RequestLog - per-request log handle.
//!
//! Opened before admission, closed after the outcome has been logged. Every
//! line goes to `<archive prefix>/<log file>` and is mirrored as a `tracing`
//! event carrying `request` and `work` fields, so the global subscriber still
//! sees everything.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tracing::Level;

pub struct RequestLog {
    work: String,
    request: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl RequestLog {
    /// Create `dir` if needed and open `dir/file_name` for appending.
    pub fn open(
        dir: &Path,
        file_name: &str,
        work: impl Into<String>,
        request: impl Into<String>,
    ) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            work: work.into(),
            request: request.into(),
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Level::ERROR, message);
    }

    pub fn log(&self, level: Level, message: impl Display) {
        let message = message.to_string();
        let (work, request) = (self.work.as_str(), self.request.as_str());
        match level {
            Level::ERROR => tracing::error!(work, request, "{message}"),
            Level::WARN => tracing::warn!(work, request, "{message}"),
            Level::INFO => tracing::info!(work, request, "{message}"),
            Level::DEBUG => tracing::debug!(work, request, "{message}"),
            _ => tracing::trace!(work, request, "{message}"),
        }

        let line = format!(
            "[{}] {}: {}: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            self.work,
            level,
            message
        );
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            tracing::warn!(path = %self.path.display(), error = %e, "request log write failed");
        }
    }

    /// Flush and close. Dropping does the same.
    pub fn close(self) {}
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writer.flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "request log flush failed");
        }
    }
}
