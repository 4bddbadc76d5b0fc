//! Tree walker.
//! Lazily enumerates every file and directory below a root exactly once,
//! parents before their children, without ever descending into a reparse point.
//!
//! Notes:
//! - Built on walkdir with `follow_links(false)`; directory reparse points that
//!   std still reports as directories (e.g. Windows mount points) are cut off
//!   explicitly with `skip_current_dir`.
//! - The walk is not cached: restart it by calling `walk_tree` again.
//! - Entries reflect what was observed at enumeration time; other actors may
//!   delete them before they are processed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

use crate::errors::{FsError, Result};
use crate::platform;

/// Attribute bits the deletion engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    pub read_only: bool,
    pub reparse_point: bool,
}

impl Attributes {
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        Self {
            read_only: meta.permissions().readonly(),
            reparse_point: platform::is_reparse_point(meta),
        }
    }
}

/// One enumerated entry. `meta` is the non-following metadata seen by the walk.
#[derive(Debug, Clone)]
pub enum FsEntry {
    File {
        path: PathBuf,
        attributes: Attributes,
        meta: fs::Metadata,
    },
    Directory {
        path: PathBuf,
        attributes: Attributes,
        meta: fs::Metadata,
    },
}

impl FsEntry {
    /// Classify `path` from its `symlink_metadata`.
    pub fn from_metadata(path: PathBuf, meta: fs::Metadata) -> Self {
        let attributes = Attributes::from_metadata(&meta);
        if platform::points_to_directory(&path, &meta) {
            FsEntry::Directory { path, attributes, meta }
        } else {
            FsEntry::File { path, attributes, meta }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FsEntry::File { path, .. } | FsEntry::Directory { path, .. } => path,
        }
    }

    pub fn attributes(&self) -> Attributes {
        match self {
            FsEntry::File { attributes, .. } | FsEntry::Directory { attributes, .. } => *attributes,
        }
    }

    pub fn metadata(&self) -> &fs::Metadata {
        match self {
            FsEntry::File { meta, .. } | FsEntry::Directory { meta, .. } => meta,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FsEntry::Directory { .. })
    }
}

/// Iterator over the subtree of a directory that is not itself a reparse point.
pub struct TreeWalker {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

/// Start a fresh walk below `root` (the root itself is not yielded).
pub fn walk_tree(root: &Path) -> TreeWalker {
    TreeWalker {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter(),
    }
}

impl Iterator for TreeWalker {
    type Item = Result<FsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let dent = match self.inner.next()? {
            Ok(d) => d,
            Err(e) => return Some(Err(FsError::walk(&self.root, e))),
        };
        let meta = match dent.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(FsError::walk(&self.root, e))),
        };
        // walkdir has already opened the entry for descent iff it saw a plain directory.
        let opened = dent.file_type().is_dir();
        let entry = FsEntry::from_metadata(dent.into_path(), meta);
        let attributes = entry.attributes();
        if attributes.reparse_point && opened {
            self.inner.skip_current_dir();
        }
        trace!(
            path = %entry.path().display(),
            dir = entry.is_directory(),
            reparse = attributes.reparse_point,
            "walked entry"
        );
        Some(Ok(entry))
    }
}
