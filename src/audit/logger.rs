use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Size past which the log is moved aside to `<name>.log.1`
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEntry<'a> {
    /// A git invocation and how it exited; `-1` for a timeout or signal
    Command {
        command: &'a str,
        dir: &'a Path,
        exit_code: i32,
    },
    /// A request refused before any git command ran
    Rejected {
        action: &'a str,
        reason: &'a str,
        dir: &'a Path,
    },
}

impl AuditEntry<'_> {
    fn dir(&self) -> &Path {
        match self {
            AuditEntry::Command { dir, .. } | AuditEntry::Rejected { dir, .. } => dir,
        }
    }

    /// `[timestamp] [user] [dir] ...` with the entry-specific tail
    pub fn render(&self, at: DateTime<Utc>, user: &str) -> String {
        format!("[{}] [{}] [{}] {}", at.to_rfc3339(), user, self.dir().display(), self)
    }
}

impl fmt::Display for AuditEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEntry::Command {
                command, exit_code, ..
            } => write!(f, "[exit:{}] {}", exit_code, command),
            AuditEntry::Rejected { action, reason, .. } => {
                write!(f, "[REJECTED] action={:?} reason={:?}", action, reason)
            }
        }
    }
}

/// Append-only record of every git invocation and every rejected request
#[derive(Debug)]
pub struct AuditLogger {
    log_path: PathBuf,
    max_size: u64,
    user: String,
    /// Rotation and append happen together
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Logger writing to [`Self::default_log_path`]
    pub fn new() -> io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_path,
            max_size: DEFAULT_MAX_SIZE,
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// `~/.config/git-gateway/history.log`
    pub fn default_log_path() -> io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            io::Error::new(io::ErrorKind::NotFound, "HOME environment variable not set")
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("git-gateway")
            .join("history.log"))
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn record(&self, entry: &AuditEntry<'_>) -> io::Result<()> {
        let line = entry.render(Utc::now(), &self.user);

        // A poisoned lock only means another writer panicked mid-append
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    pub fn log_command(&self, command: &str, dir: &Path, exit_code: i32) -> io::Result<()> {
        self.record(&AuditEntry::Command {
            command,
            dir,
            exit_code,
        })
    }

    pub fn log_rejection(&self, action: &str, reason: &str, dir: &Path) -> io::Result<()> {
        self.record(&AuditEntry::Rejected {
            action,
            reason,
            dir,
        })
    }

    fn rotate_if_needed(&self) -> io::Result<()> {
        let size = match fs::metadata(&self.log_path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if size > self.max_size {
            fs::rename(&self.log_path, self.log_path.with_extension("log.1"))?;
        }
        Ok(())
    }
}
