//! Unix implementations of platform helpers.
//!
//! On Unix a "reparse point" is a symbolic link. "Read-only" means the owner
//! write bit is missing; clearing it restores only that bit.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

/// True if the entry described by `meta` (from `symlink_metadata`) redirects elsewhere.
#[inline]
pub fn is_reparse_point(meta: &fs::Metadata) -> bool {
    meta.file_type().is_symlink()
}

/// Whether the entry at `path` should be handled as a directory.
/// Symlinks are resolved; a dangling symlink counts as a file.
pub fn points_to_directory(path: &Path, meta: &fs::Metadata) -> bool {
    if is_reparse_point(meta) {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    } else {
        meta.is_dir()
    }
}

/// Add the owner write bit. Never call on a symlink: chmod follows the link.
pub fn clear_readonly(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    let mode = meta.permissions().mode();
    if mode & 0o200 != 0 {
        return Ok(());
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o200))
}

/// Remove a directory-like reparse point without touching its target.
/// A symlink is unlinked like a file regardless of what it points to.
#[inline]
pub fn remove_reparse_dir(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Open log file for appending; set 0600 only when creating a new file.
/// If the file already exists, we preserve its existing permissions to avoid
/// clobbering administrator adjustments (e.g. group-readable for log shipping).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600) // applies on create
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)?;
    if !existed {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn clear_readonly_restores_owner_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.txt");
        fs::write(&path, b"x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();
        let meta = fs::symlink_metadata(&path).unwrap();
        clear_readonly(&path, &meta).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn symlink_to_dir_is_directory_like_reparse_point() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        symlink(&target, &link).unwrap();

        let meta = fs::symlink_metadata(&link).unwrap();
        assert!(is_reparse_point(&meta));
        assert!(points_to_directory(&link, &meta));

        remove_reparse_dir(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.is_dir(), "target must survive link removal");
    }

    #[test]
    fn dangling_symlink_is_not_directory() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("dangling");
        symlink(dir.path().join("missing"), &link).unwrap();
        let meta = fs::symlink_metadata(&link).unwrap();
        assert!(is_reparse_point(&meta));
        assert!(!points_to_directory(&link, &meta));
    }

    #[test]
    fn new_log_file_gets_0600() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new_log.txt");
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "newly created log file should be 0600");
    }

    #[test]
    fn preserve_existing_log_file_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, b"hello").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640, "existing permissions should be preserved");
    }
}
