//! Atomic rename helper.
//! - Renames a directory with classified, context-rich errors.
//! - On Unix, best-effort fsync of the destination's parent after the rename.
//!
//! A same-volume rename is atomic; across volumes it fails (EXDEV /
//! ERROR_NOT_SAME_DEVICE) rather than degrading into a copy.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::{Result, io_err};

pub fn rename_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::rename(src, dst).map_err(io_err("rename directory", src))?;
    debug!(src = %src.display(), dst = %dst.display(), "renamed directory");

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // The rename already happened; fsync failure is not reported.
        let _ = fsync_dir(parent);
    }

    Ok(())
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}
