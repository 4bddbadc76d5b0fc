//! Staged directory move.
//! Relocates `source` to `target` through an intermediate `staging` directory:
//!
//! 1. delete any stale `staging` tree
//! 2. create `staging`'s parent
//! 3. rename `source` -> `staging`
//! 4. delete any existing `target` tree
//! 5. create `target`'s parent
//! 6. rename `staging` -> `target`
//!
//! Both renames are atomic on a single volume, so the only non-atomic windows
//! are the delete/create-parent steps, which happen before each rename.
//!
//! All three paths must be non-empty UTF-8; this is checked before anything
//! is touched.
//!
//! Limitation: there is no rollback. If a step after 3 fails, the tree is left
//! at `staging` and recovering it is the caller's job.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::errors::{FsError, Result, io_err};
use crate::path_algebra::parent_directory_name;
use crate::platform::Platform;

use super::atomic::rename_dir;
use super::delete::{DeleteOptions, delete_directory};

pub fn move_directory(
    source: &Path,
    target: &Path,
    staging: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut texts = Vec::with_capacity(3);
    for (name, p) in [("source", source), ("target", target), ("staging", staging)] {
        if p.as_os_str().is_empty() {
            return Err(FsError::InvalidArgument(format!("{name} path must not be empty")));
        }
        let text = p.to_str().ok_or_else(|| {
            FsError::InvalidArgument(format!("{name} path '{}' is not valid UTF-8", p.display()))
        })?;
        texts.push(text);
    }
    let (target_text, staging_text) = (texts[1], texts[2]);
    if !source.is_dir() {
        return Err(FsError::InvalidArgument(format!(
            "source directory '{}' does not exist",
            source.display()
        )));
    }
    cancel.check()?;

    let platform = Platform::current();
    let outright = DeleteOptions::default();

    debug!(staging = %staging.display(), "clearing stale staging directory");
    delete_directory(staging, &outright, cancel)?;
    ensure_parent_exists(staging_text, platform)?;
    rename_dir(source, staging)?;

    debug!(target = %target.display(), "clearing existing target directory");
    delete_directory(target, &outright, cancel)?;
    ensure_parent_exists(target_text, platform)?;
    rename_dir(staging, target)?;

    info!(
        source = %source.display(),
        target = %target.display(),
        staging = %staging.display(),
        "Moved directory"
    );
    Ok(())
}

/// Directory that must exist before something can be renamed to `path`;
/// `None` for a bare name in the current directory.
fn parent_to_create(path: &str, platform: Platform) -> Option<PathBuf> {
    let parent = parent_directory_name(path, platform);
    (!parent.is_empty()).then(|| PathBuf::from(parent))
}

fn ensure_parent_exists(path: &str, platform: Platform) -> Result<()> {
    let Some(parent) = parent_to_create(path, platform) else {
        return Ok(());
    };
    fs::create_dir_all(&parent).map_err(io_err("create parent directory", &parent))
}
