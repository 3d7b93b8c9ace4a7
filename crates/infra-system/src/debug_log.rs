// Debug log file
// Plain append-only text file, one timestamped line per entry
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use focusblox_core::port::TimeProvider;

pub const DEBUG_LOG_FILE_NAME: &str = "focusblox-debug.log";

/// Returned by `read_log` when nothing has been written yet
pub const NO_LOGS_MESSAGE: &str = "No logs yet";

/// Append-only, line-oriented debug log.
///
/// Each line is `[<ISO 8601 timestamp>] <message>`. Writes from concurrent
/// callers are serialized so lines never interleave. I/O failures are
/// reported through `tracing` and otherwise ignored.
pub struct DebugLog {
    path: PathBuf,
    write_lock: Mutex<()>,
    time_provider: Arc<dyn TimeProvider>,
}

impl DebugLog {
    pub fn new(path: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            time_provider,
        }
    }

    /// `<temp dir>/focusblox-debug.log`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(DEBUG_LOG_FILE_NAME)
    }

    pub fn log_path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line
    pub fn log(&self, message: &str) {
        let line = format!("[{}] {}\n", self.timestamp(), message);
        debug!(target: "focusblox::debug_log", "{}", message);

        // A poisoned lock still serializes writers
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to write debug log");
        }
    }

    /// Whole log contents, or "No logs yet" when the file does not exist
    pub fn read_log(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => NO_LOGS_MESSAGE.to_string(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read debug log");
                NO_LOGS_MESSAGE.to_string()
            }
        }
    }

    /// Remove the log file
    pub fn clear_log(&self) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Debug log cleared"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clear debug log"),
        }
    }

    fn timestamp(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.time_provider.now_millis())
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
