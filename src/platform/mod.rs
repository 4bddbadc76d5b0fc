//! Platform-specific helpers.
//!
//! Two concerns live here:
//! - `Platform`, the explicit path-convention flag threaded through the path
//!   algebra (separators, rootedness, case sensitivity, invalid characters).
//!   It is a plain value so callers and tests can ask about any platform,
//!   not just the host.
//! - Attribute and reparse-point handling for the host OS, hidden behind a
//!   uniform API (Unix/Windows) so the deletion engine stays platform-agnostic.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{
    clear_readonly, is_reparse_point, open_log_file_secure_append, points_to_directory,
    remove_reparse_dir,
};

#[cfg(not(unix))]
pub use windows::{
    clear_readonly, is_reparse_point, open_log_file_secure_append, points_to_directory,
    remove_reparse_dir,
};

/// Path conventions of an operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Slash-rooted, case-sensitive.
    Linux,
    /// Slash-rooted, case-insensitive (default APFS/HFS+ volumes).
    MacOs,
    /// Drive- or backslash-rooted, case-insensitive, accepts both separators.
    Windows,
}

/// Characters rejected anywhere in a Windows relative path.
const WINDOWS_INVALID_PATH_CHARS: &[char] = &['|', '\0'];
/// Characters additionally rejected in a Windows file name.
const WINDOWS_INVALID_NAME_CHARS: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/', '\0'];

impl Platform {
    /// The platform this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    #[inline]
    pub fn is_windows_style(self) -> bool {
        self == Platform::Windows
    }

    /// Preferred separator.
    #[inline]
    pub fn separator(self) -> char {
        if self.is_windows_style() { '\\' } else { '/' }
    }

    #[inline]
    pub fn is_separator(self, c: char) -> bool {
        c == '/' || (self.is_windows_style() && c == '\\')
    }

    #[inline]
    pub fn is_case_sensitive(self) -> bool {
        self == Platform::Linux
    }

    /// True when `path` starts at a root: `/x` on POSIX; `\x`, `/x` or `C:` on Windows.
    pub fn is_rooted(self, path: &str) -> bool {
        let mut chars = path.chars();
        match chars.next() {
            Some(c) if self.is_separator(c) => true,
            Some(c) if self.is_windows_style() && c.is_ascii_alphabetic() => {
                chars.next() == Some(':')
            }
            _ => false,
        }
    }

    /// Characters that may not appear anywhere in a path.
    pub fn is_invalid_path_char(self, c: char) -> bool {
        if self.is_windows_style() {
            WINDOWS_INVALID_PATH_CHARS.contains(&c) || (c as u32) < 32
        } else {
            c == '\0'
        }
    }

    /// Characters that may not appear in a single file name component.
    pub fn is_invalid_name_char(self, c: char) -> bool {
        if self.is_windows_style() {
            WINDOWS_INVALID_NAME_CHARS.contains(&c) || (c as u32) < 32
        } else {
            c == '\0' || c == '/'
        }
    }
}
