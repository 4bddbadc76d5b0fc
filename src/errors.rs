//! Typed error definitions for fs_lifecycle.
//!
//! Every filesystem failure is classified into one of a few well-known
//! categories so callers can decide what is fatal, what is retryable and what
//! simply means "already gone".
//!
//! Usage:
//!   fs::remove_file(p).map_err(io_err("remove file", p))?;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// Target already absent. Top-level deletion entry points treat this as success.
    #[error("{op} '{}': {source}{}", path.display(), Hint(source))]
    NotFound {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{op} '{}': {source}{}", path.display(), Hint(source))]
    PermissionDenied {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Locked, in use, not yet empty, or any other transient I/O failure.
    /// The only category eligible for retry.
    #[error("{op} '{}': {source}{}", path.display(), Hint(source))]
    Busy {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("'{relative}' points to a location outside of the root '{root}'")]
    InvalidPath { root: String, relative: String },
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    /// Classify an io::Error raised by `op` on `path`.
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { op, path, source },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { op, path, source },
            _ => FsError::Busy { op, path, source },
        }
    }

    /// Classify a walkdir failure, keeping the path it was reported for.
    pub fn walk(root: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        FsError::io("enumerate directory", &path, io::Error::from(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FsError::Busy { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FsError::Cancelled)
    }

    /// Short machine-friendly category name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound { .. } => "not_found",
            FsError::PermissionDenied { .. } => "permission_denied",
            FsError::Busy { .. } => "busy",
            FsError::Cancelled => "cancelled",
            FsError::InvalidArgument(_) => "invalid_argument",
            FsError::InvalidPath { .. } => "invalid_path",
        }
    }

    /// Path the failure refers to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FsError::NotFound { path, .. }
            | FsError::PermissionDenied { path, .. }
            | FsError::Busy { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Adapter for `.map_err(...)`: converts io::Error into a classified FsError.
pub fn io_err<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> FsError + 'a {
    move |e: io::Error| FsError::io(op, path, e)
}

/// Platform-aware hint for a raw OS error code.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => {
                Some("permission denied; check ownership and write permissions")
            }
            libc::EBUSY | libc::ETXTBSY => {
                Some("resource busy; another process is holding it open")
            }
            libc::ENOTEMPTY | libc::EEXIST => {
                Some("directory not empty; something was created inside it concurrently")
            }
            libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
            libc::ENOENT => Some("path not found"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ELOOP => Some("too many symbolic link levels; possible symlink cycle"),
            libc::ENAMETOOLONG => Some("filename or path too long"),
            libc::EMFILE | libc::ENFILE => Some("file descriptor limit reached"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            // ERROR_ACCESS_DENIED
            5 => Some("access denied; check permissions and the read-only attribute"),
            2 | 3 => Some("path not found"), // FILE / PATH NOT FOUND
            17 => Some("not same device; cross-volume rename"), // ERROR_NOT_SAME_DEVICE
            32 => Some("sharing violation; file is in use"), // ERROR_SHARING_VIOLATION
            33 => Some("lock violation; part of the file is locked"), // ERROR_LOCK_VIOLATION
            145 => Some("directory not empty"), // ERROR_DIR_NOT_EMPTY
            206 => Some("filename or path too long"), // ERROR_FILENAME_EXCED_RANGE
            4390 => Some("not a reparse point"), // ERROR_NOT_A_REPARSE_POINT
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

/// Renders " (hint) [os code: N]" after an io::Error, or nothing.
struct Hint<'a>(&'a io::Error);

impl fmt::Display for Hint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(code) = self.0.raw_os_error() else {
            return Ok(());
        };
        if let Some(hint) = os_hint(code) {
            write!(f, " ({hint})")?;
        }
        write!(f, " [os code: {code}]")
    }
}
