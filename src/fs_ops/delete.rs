//! Deletion engine.
//!
//! Removes a directory tree in two phases:
//! 1) parallel: walk the tree, normalize attributes, delete files and reparse
//!    points, and collect ordinary directories into a `DeletionPlan`;
//! 2) sequential: remove the collected directories deepest-first, then the root.
//!
//! Notes:
//! - Each invocation gets its own child `CancellationToken`. The first
//!   unrecoverable per-entry failure cancels it, which stops new work while
//!   in-flight entries finish; that original failure is then returned.
//! - Partial work is never rolled back.
//! - A path that is already gone counts as deleted.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::cancel::CancellationToken;
use crate::errors::{FsError, Result, io_err};
use crate::platform;

use super::plan::DeletionPlan;
use super::walk::{FsEntry, walk_tree};

/// Knobs for one `delete_directory` call.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Remove everything inside the directory but keep the directory itself.
    pub contents_only: bool,
    /// Swallow per-entry failures and keep going.
    pub continue_on_error: bool,
    /// Worker threads for the parallel phase; `None` or 0 uses the global pool
    /// (sized by available parallelism).
    pub workers: Option<usize>,
}

impl DeleteOptions {
    pub fn contents_only() -> Self {
        Self {
            contents_only: true,
            ..Self::default()
        }
    }
}

/// Delete the directory at `path` (or only its contents). Succeeds immediately
/// if nothing is there, or if `path` is not a directory.
pub fn delete_directory(
    path: &Path,
    opts: &DeleteOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    cancel.check()?;
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "directory already absent");
            return Ok(());
        }
        Err(e) => return Err(FsError::io("inspect directory", path, e)),
    };
    let root = FsEntry::from_metadata(path.to_path_buf(), meta);
    if !root.is_directory() {
        debug!(path = %path.display(), "not a directory; nothing to delete");
        return Ok(());
    }

    let attributes = root.attributes();
    if attributes.reparse_point {
        if opts.contents_only {
            return Err(FsError::InvalidArgument(format!(
                "refusing to clear contents through reparse point '{}'",
                path.display()
            )));
        }
        ignore_missing(remove_reparse_directory(path))?;
        info!(path = %path.display(), "Deleted reparse point");
        return Ok(());
    }
    // On Unix the root's write bit gates unlinking its children, so it is
    // needed even when the root itself stays.
    if attributes.read_only && (!opts.contents_only || cfg!(unix)) {
        platform::clear_readonly(path, root.metadata())
            .map_err(io_err("clear read-only attribute", path))?;
    }

    debug!(
        path = %path.display(),
        contents_only = opts.contents_only,
        continue_on_error = opts.continue_on_error,
        "deleting directory tree"
    );

    let plan = DeletionPlan::new();
    let removed = AtomicUsize::new(0);
    let walk_cancel = cancel.child();
    let entries = walk_tree(path).map(|item| item.and_then(prepare_entry));
    in_worker_pool(opts.workers, || {
        for_each_cancellable(entries, &walk_cancel, opts.continue_on_error, |entry| {
            process_entry(entry, &plan)?;
            removed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    })??;

    let dirs = plan.into_removal_order();
    debug!(path = %path.display(), pending_dirs = dirs.len(), "draining directories");
    for dir in &dirs {
        cancel.check()?;
        remove_dir(dir, opts.continue_on_error)?;
    }
    if !opts.contents_only {
        cancel.check()?;
        ignore_missing(fs::remove_dir(path).map_err(io_err("remove directory", path)))?;
    }

    info!(
        path = %path.display(),
        entries = removed.load(Ordering::Relaxed),
        dirs = dirs.len(),
        contents_only = opts.contents_only,
        "Deleted directory tree"
    );
    Ok(())
}

/// Delete a single file (or file-like reparse point). No-op if absent.
pub fn delete_file(path: &Path, cancel: &CancellationToken) -> Result<()> {
    cancel.check()?;
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io("inspect file", path, e)),
    };
    let entry = FsEntry::from_metadata(path.to_path_buf(), meta);
    if entry.is_directory() && !entry.attributes().reparse_point {
        return Err(FsError::InvalidArgument(format!(
            "'{}' is a directory",
            path.display()
        )));
    }
    ignore_missing(remove_leaf(entry))?;
    debug!(path = %path.display(), "deleted file");
    Ok(())
}

/// Delete whatever is at `path`: directory-delete first, then file-delete.
pub fn delete_path(path: &Path, cancel: &CancellationToken) -> Result<()> {
    delete_directory(path, &DeleteOptions::default(), cancel)?;
    delete_file(path, cancel)
}

/// Run `f` over `items` on the current rayon pool until done or cancelled.
///
/// - Every worker checks `cancel` before taking an item.
/// - `NotFound` failures are treated as handled (someone else removed it).
/// - Other failures are swallowed when `continue_on_error`; otherwise the first
///   one is kept, `cancel` is fired, and that failure is returned once the
///   in-flight items finish.
/// - If `cancel` fires for any other reason, the result is `Cancelled`.
pub(crate) fn for_each_cancellable<I, T, F>(
    items: I,
    cancel: &CancellationToken,
    continue_on_error: bool,
    f: F,
) -> Result<()>
where
    I: Iterator<Item = Result<T>> + Send,
    T: Send,
    F: Fn(T) -> Result<()> + Sync + Send,
{
    let first_error: Mutex<Option<FsError>> = Mutex::new(None);
    let outcome = items.par_bridge().try_for_each(|item| {
        if cancel.is_cancelled() {
            return Err(());
        }
        match item.and_then(&f) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                trace!(error = %e, "entry vanished before it was processed");
                Ok(())
            }
            Err(e) if continue_on_error => {
                warn!(error = %e, kind = e.kind(), "ignoring failure and continuing");
                Ok(())
            }
            Err(e) => {
                let mut slot = first_error.lock().unwrap_or_else(|p| p.into_inner());
                if slot.is_none() {
                    *slot = Some(e);
                }
                cancel.cancel();
                Err(())
            }
        }
    });

    if let Some(e) = first_error.into_inner().unwrap_or_else(|p| p.into_inner()) {
        return Err(e);
    }
    if outcome.is_err() {
        return Err(FsError::Cancelled);
    }
    Ok(())
}

/// Run `op` on a dedicated pool of `workers` threads, or on the global pool.
fn in_worker_pool<R, F>(workers: Option<usize>, op: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match workers.filter(|n| *n > 0) {
        None => Ok(op()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("fs-delete-{i}"))
                .build()
                .map_err(|e| {
                    FsError::InvalidArgument(format!("cannot start {n} delete workers: {e}"))
                })?;
            Ok(pool.install(op))
        }
    }
}

/// Sequential pre-pass on the walk: a directory must be writable before any
/// of its children are handed to a worker.
fn prepare_entry(entry: FsEntry) -> Result<FsEntry> {
    if let FsEntry::Directory { path, attributes, meta } = &entry
        && attributes.read_only
        && !attributes.reparse_point
    {
        platform::clear_readonly(path, meta).map_err(io_err("clear read-only attribute", path))?;
    }
    Ok(entry)
}

fn process_entry(entry: FsEntry, plan: &DeletionPlan) -> Result<()> {
    match entry {
        FsEntry::Directory { path, attributes, .. } if !attributes.reparse_point => {
            plan.push(path);
            Ok(())
        }
        leaf => remove_leaf(leaf),
    }
}

/// Remove a file or a reparse point, clearing read-only first where that is safe.
fn remove_leaf(entry: FsEntry) -> Result<()> {
    match entry {
        FsEntry::Directory { path, .. } => remove_reparse_directory(&path),
        FsEntry::File { path, attributes, meta } => {
            if attributes.read_only && !attributes.reparse_point {
                platform::clear_readonly(&path, &meta)
                    .map_err(io_err("clear read-only attribute", &path))?;
            }
            fs::remove_file(&path).map_err(io_err("remove file", &path))?;
            trace!(path = %path.display(), "removed file");
            Ok(())
        }
    }
}

/// Remove a directory-like reparse point as a unit. If the directory-style
/// removal reports the target gone (a link to a link whose target vanished
/// mid-walk), fall back to file-style removal of the link itself.
fn remove_reparse_directory(path: &Path) -> Result<()> {
    match platform::remove_reparse_dir(path) {
        Ok(()) => {
            trace!(path = %path.display(), "removed reparse point");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "reparse target vanished; removing link as a file");
            fs::remove_file(path).map_err(io_err("remove reparse point", path))
        }
        Err(e) => Err(FsError::io("remove reparse point", path, e)),
    }
}

fn remove_dir(dir: &Path, continue_on_error: bool) -> Result<()> {
    match ignore_missing(fs::remove_dir(dir).map_err(io_err("remove directory", dir))) {
        Err(e) if continue_on_error => {
            warn!(error = %e, kind = e.kind(), "ignoring failure and continuing");
            Ok(())
        }
        other => other,
    }
}

fn ignore_missing(res: Result<()>) -> Result<()> {
    match res {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    fn busy(i: usize) -> FsError {
        FsError::io("work", &PathBuf::from(format!("/item/{i}")), io::Error::other("locked"))
    }

    #[test]
    fn processes_every_item_when_nothing_fails() {
        let seen = AtomicUsize::new(0);
        let token = CancellationToken::new();
        let items = (0..500usize).map(Ok);
        for_each_cancellable(items, &token, false, |_| {
            seen.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 500);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn first_failure_stops_new_work_and_is_returned() {
        let seen = AtomicUsize::new(0);
        let parent = CancellationToken::new();
        let token = parent.child();
        let items = (0..100_000usize).map(Ok);
        let err = for_each_cancellable(items, &token, false, |i| {
            seen.fetch_add(1, Ordering::Relaxed);
            if i == 10 { Err(busy(i)) } else { Ok(()) }
        })
        .unwrap_err();
        assert_eq!(err.path(), Some(Path::new("/item/10")));
        assert!(token.is_cancelled());
        assert!(!parent.is_cancelled(), "the caller's token must not be fired");
        assert!(seen.load(Ordering::Relaxed) < 100_000);
    }

    #[test]
    fn continue_on_error_swallows_failures() {
        let seen = AtomicUsize::new(0);
        let token = CancellationToken::new();
        let items = (0..200usize).map(Ok);
        for_each_cancellable(items, &token, true, |i| {
            seen.fetch_add(1, Ordering::Relaxed);
            if i % 7 == 0 { Err(busy(i)) } else { Ok(()) }
        })
        .unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 200);
    }

    #[test]
    fn not_found_is_treated_as_handled() {
        let token = CancellationToken::new();
        let items = (0..10usize).map(|i| {
            if i == 3 {
                let gone = io::Error::from(io::ErrorKind::NotFound);
                Err(FsError::io("walk", Path::new("/gone"), gone))
            } else {
                Ok(i)
            }
        });
        for_each_cancellable(items, &token, false, |_| Ok(())).unwrap();
    }

    #[test]
    fn external_cancellation_surfaces_as_cancelled() {
        let caller = CancellationToken::new();
        let token = caller.child();
        let seen = AtomicUsize::new(0);
        let items = (0..100_000usize).map(Ok);
        let err = for_each_cancellable(items, &token, false, |i| {
            seen.fetch_add(1, Ordering::Relaxed);
            if i == 50 {
                caller.cancel();
            }
            Ok(())
        })
        .unwrap_err();
        assert!(err.is_cancelled());
        assert!(seen.load(Ordering::Relaxed) < 100_000);
    }

    #[test]
    fn dedicated_pool_runs_the_phase() {
        let token = CancellationToken::new();
        let res = in_worker_pool(Some(2), || {
            for_each_cancellable((0..50usize).map(Ok), &token, false, |_| Ok(()))
        });
        assert!(matches!(res, Ok(Ok(()))));
    }
}
