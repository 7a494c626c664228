//! # Errors
//!
//! Every failure the application can hit, as plain values. Background tasks
//! never panic or bubble errors up the task tree: they return an `AppError`
//! inside a message, and the controller decides how it is surfaced.
//!
//! | Variant       | Surfaced as                                   |
//! |---------------|-----------------------------------------------|
//! | `FatalInit`   | full-screen error, any key exits              |
//! | `Discovery`   | notice in the file listing, zero results      |
//! | `ContentRead` | error inside the document view, esc returns   |
//! | `Render`      | raw body shown instead of rendered output     |

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The launch path could not be inspected.
    FatalInit { path: PathBuf, message: String },
    /// A discovery run could not start.
    Discovery { run: u64, reason: DiscoveryError },
    /// The body of the document being loaded could not be read.
    ContentRead {
        seq: u64,
        path: PathBuf,
        message: String,
    },
    /// Converting a body to display lines failed.
    Render { seq: u64, message: String },
}

impl AppError {
    pub fn fatal_init(path: &Path, err: &io::Error) -> Self {
        AppError::FatalInit {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::FatalInit { .. })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::FatalInit { path, message } => {
                write!(f, "unable to open {}: {message}", path.display())
            }
            AppError::Discovery { reason, .. } => write!(f, "{reason}"),
            AppError::ContentRead { path, message, .. } => {
                write!(f, "unable to read {}: {message}", path.display())
            }
            AppError::Render { message, .. } => write!(f, "render error: {message}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Why a discovery run could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The root path does not exist.
    NotFound(PathBuf),
    /// The root path exists but is not a directory.
    NotADirectory(PathBuf),
    /// The root could not be inspected (permissions, broken link).
    Io { path: PathBuf, message: String },
    /// An extension filter or ignore pattern is not a valid glob.
    BadPattern(String),
}

impl DiscoveryError {
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => DiscoveryError::NotFound(path.to_path_buf()),
            _ => DiscoveryError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NotFound(path) => {
                write!(f, "couldn't search {}: no such directory", path.display())
            }
            DiscoveryError::NotADirectory(path) => {
                write!(f, "couldn't search {}: not a directory", path.display())
            }
            DiscoveryError::Io { path, message } => {
                write!(f, "couldn't search {}: {message}", path.display())
            }
            DiscoveryError::BadPattern(msg) => write!(f, "invalid search pattern: {msg}"),
        }
    }
}

impl std::error::Error for DiscoveryError {}
