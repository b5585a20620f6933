//! Append-only operator log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ccg_secret::LogSink;

/// Writes one `\r\n`-terminated line per event to a file.
///
/// The parent directory is created on open. Each line goes out in a single
/// `write_all` under a mutex, so lines from concurrent callers sharing the
/// file never interleave.
pub struct FileLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLog {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLog {
    fn line(&self, entry: &str) {
        let mut record = String::with_capacity(entry.len() + 2);
        record.push_str(entry);
        record.push_str("\r\n");

        // A poisoned lock still guards a usable file handle.
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = file.write_all(record.as_bytes()) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write log line");
        }
    }
}

impl std::fmt::Debug for FileLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLog").field("path", &self.path).finish()
    }
}
