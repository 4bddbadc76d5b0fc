//! Pre-flight permission probe.
//! Walks the ancestors of a path and checks that each existing one can be
//! listed, so a deletion fails early with the offending directory named
//! instead of halfway through a tree.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::{FsError, Result};

/// Fail with `PermissionDenied` naming the first ancestor of `path` that
/// cannot be read. Ancestors that do not exist are skipped.
pub fn ensure_ancestors_readable(path: &Path) -> Result<()> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| FsError::io("resolve current directory", path, e))?
            .join(path)
    };
    // Canonicalize when possible so ".." does not skip a real ancestor.
    let start = dunce::canonicalize(&absolute).unwrap_or(absolute);

    for ancestor in start.ancestors().skip(1) {
        match fs::read_dir(ancestor) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(FsError::io("read directory", ancestor, e));
            }
            // Not a directory, too many open files, ...: not a permission verdict.
            Err(e) => debug!(path = %ancestor.display(), error = %e, "skipping ancestor check"),
        }
    }
    Ok(())
}
