use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use watchdog_core::error_line;
use watchdog_logging::{watch_error, watch_warn};

/// Append-only text log shared by alerts and error entries.
///
/// The program never reads it back; it is never truncated or rotated.
#[derive(Debug, Clone)]
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }

    /// Echoes one `ERROR:` entry to stdout, appends it, and reports it on
    /// the diagnostic log.
    pub fn record_error(&self, at: &DateTime<Local>, message: &str) {
        watch_error!("{}", message);
        let line = error_line(at, message);
        println!("{line}");
        if let Err(err) = self.append(&line) {
            watch_warn!("Failed to append to alert log {:?}: {}", self.path, err);
        }
    }
}
