//! String-level path algebra.
//!
//! Nothing here touches the disk: every function works identically for paths
//! that do not exist. The platform is an explicit argument so results are
//! reproducible for any path convention, whatever the host.

use crate::errors::{FsError, Result};
use crate::platform::Platform;

/// Resolve `relative` against the absolute `root`, collapsing `.` and `..`.
///
/// `..` may cancel components of `relative` but never components of `root`:
/// a path that climbs above the root fails with `InvalidPath`. The result is
/// rebuilt with the platform separator: a single leading `/` on POSIX, a
/// drive-rooted form (`C:\`) on Windows when only the drive remains.
pub fn resolve_path(platform: Platform, root: &str, relative: &str) -> Result<String> {
    if root.is_empty() || relative.is_empty() {
        return Err(FsError::InvalidArgument(
            "root and relative path must be non-empty".into(),
        ));
    }
    if !platform.is_rooted(root) {
        return Err(FsError::InvalidArgument(format!(
            "'{root}' should be a rooted path"
        )));
    }
    if relative.chars().any(|c| platform.is_invalid_path_char(c)) {
        return Err(FsError::InvalidArgument(format!(
            "'{relative}' contains invalid path characters"
        )));
    }
    let file_name = relative
        .rsplit(|c| platform.is_separator(c))
        .next()
        .unwrap_or_default();
    if file_name.chars().any(|c| platform.is_invalid_name_char(c)) {
        return Err(FsError::InvalidArgument(format!(
            "'{relative}' contains invalid file name characters"
        )));
    }
    if platform.is_rooted(relative) {
        return Err(FsError::InvalidArgument(format!(
            "'{relative}' can not be a rooted path"
        )));
    }

    let anchor = windows_anchor(platform, root);
    let mut segments = collapse_root(platform, root);

    // Walk the relative part backwards; `pending` counts `..` still looking for
    // a real component to cancel.
    let mut pending = 0usize;
    let mut kept: Vec<&str> = Vec::new();
    for segment in split_segments(platform, relative).rev() {
        match segment {
            "." => {}
            ".." => pending += 1,
            _ if pending > 0 => pending -= 1,
            _ => kept.push(segment),
        }
    }
    if pending > 0 {
        return Err(FsError::InvalidPath {
            root: root.to_string(),
            relative: relative.to_string(),
        });
    }
    segments.extend(kept.into_iter().rev());

    let sep = platform.separator().to_string();
    let joined = segments.join(&sep);
    let resolved = if !platform.is_windows_style() {
        format!("{sep}{joined}")
    } else if anchor > 0 {
        format!("{}{joined}", sep.repeat(anchor))
    } else if segments.len() == 1 {
        format!("{joined}{sep}")
    } else if segments.is_empty() {
        sep
    } else {
        joined
    };
    Ok(resolved)
}

/// Return `path` relative to `folder`, or `path` unchanged when it does not
/// live under `folder`. Matching is case-sensitive only on Linux-style platforms
/// and must end on a separator boundary.
pub fn make_relative<'a>(platform: Platform, path: &'a str, folder: &str) -> &'a str {
    if folder.is_empty() {
        return path;
    }
    let Some(rest) = strip_prefix(platform, path, folder) else {
        return path;
    };
    if rest.is_empty() {
        return "";
    }
    if folder.ends_with(|c| platform.is_separator(c)) {
        return rest;
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if platform.is_separator(c) => chars.as_str(),
        _ => path,
    }
}

/// Parent directory of `path` as a string: trailing separators are trimmed
/// and the last segment dropped. Rooted POSIX paths keep their leading `/`;
/// Windows paths keep their `\\server` or `\` anchor, and a lone drive keeps
/// its root (`C:\`). Blank input yields an empty string.
pub fn parent_directory_name(path: &str, platform: Platform) -> String {
    if path.trim().is_empty() {
        return String::new();
    }
    let sep = platform.separator().to_string();
    let trimmed = path.trim_end_matches(|c| platform.is_separator(c));
    let mut segments: Vec<&str> = split_segments(platform, trimmed).collect();
    segments.pop();
    let joined = segments.join(&sep);
    if !platform.is_windows_style() {
        return if path.starts_with('/') { format!("/{joined}") } else { joined };
    }
    match windows_anchor(platform, path) {
        0 if segments.len() == 1 && is_drive(platform, segments[0]) => {
            format!("{joined}{sep}")
        }
        0 => joined,
        n => format!("{}{joined}", sep.repeat(n)),
    }
}

fn split_segments(platform: Platform, path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split(move |c| platform.is_separator(c))
        .filter(|s| !s.is_empty())
}

/// Root components with its own `.`/`..` collapsed. A Windows drive (`C:`)
/// anchors the stack and is never popped.
fn collapse_root(platform: Platform, root: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for segment in split_segments(platform, root) {
        match segment {
            "." => {}
            ".." => {
                let anchored = out.len() == 1 && is_drive(platform, out[0]);
                if !anchored {
                    out.pop();
                }
            }
            _ => out.push(segment),
        }
    }
    out
}

/// Leading separators that anchor a Windows path: 2 for UNC (`\\server`),
/// 1 for a drive-less rooted path (`\a`), 0 otherwise.
fn windows_anchor(platform: Platform, path: &str) -> usize {
    if !platform.is_windows_style() {
        return 0;
    }
    path.chars()
        .take(2)
        .take_while(|c| platform.is_separator(*c))
        .count()
}

fn is_drive(platform: Platform, segment: &str) -> bool {
    platform.is_windows_style() && segment.len() == 2 && segment.ends_with(':')
}

/// `path` with `prefix` removed, honouring the platform's case rule.
fn strip_prefix<'a>(platform: Platform, path: &'a str, prefix: &str) -> Option<&'a str> {
    if platform.is_case_sensitive() {
        return path.strip_prefix(prefix);
    }
    let mut rest = path.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}
