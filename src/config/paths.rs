//! Default path helpers and symlink checks.
//! Determines the OS-appropriate config path and detects symlinked ancestors for safety.

use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Config file to read: `$FS_LIFECYCLE_CONFIG` if set, else the OS default.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("fs_lifecycle");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("fs_lifecycle")
                .join("config.xml")
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
