//! Windows implementations of platform helpers.
//!
//! Notes:
//! - Reparse points (symlinks, junctions, mount points) are detected through
//!   FILE_ATTRIBUTE_REPARSE_POINT, not just std's symlink notion.
//! - Directory reparse points are removed with RemoveDirectory semantics, which
//!   deletes the link itself and never the target's contents.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::windows::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use windows_sys::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_READONLY, FILE_ATTRIBUTE_REPARSE_POINT,
};

#[inline]
pub fn is_reparse_point(meta: &fs::Metadata) -> bool {
    meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
}

/// Whether the entry should be handled as a directory. For reparse points the
/// directory bit describes the link itself, which is what removal needs.
pub fn points_to_directory(_path: &Path, meta: &fs::Metadata) -> bool {
    meta.file_type().is_symlink_dir() || meta.file_attributes() & FILE_ATTRIBUTE_DIRECTORY != 0
}

/// Drop FILE_ATTRIBUTE_READONLY. Never call on a reparse point.
pub fn clear_readonly(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    if meta.file_attributes() & FILE_ATTRIBUTE_READONLY == 0 {
        return Ok(());
    }
    let mut perms = meta.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    fs::set_permissions(path, perms)
}

#[inline]
pub fn remove_reparse_dir(path: &Path) -> io::Result<()> {
    fs::remove_dir(path)
}

/// Open log file for appending (best-effort; no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}
