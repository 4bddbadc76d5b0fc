//! Core library for `fs_lifecycle`.
//!
//! Filesystem lifecycle primitives for processes that must reliably create,
//! move and, above all, destroy directory trees of arbitrary shape: trees
//! with reparse points (symlinks, junctions), read-only items, and entries
//! that other actors modify or delete while we work.
//!
//! - [`fs_ops`]: tree walker, parallel deletion engine, retry wrapper, staged move.
//! - [`path_algebra`]: string-level path resolution that refuses to escape a root.
//! - [`cancel`]: linked cancellation tokens shared with worker threads.
//! - [`errors`]: the failure taxonomy every operation reports in.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod path_algebra;
pub mod platform;

pub use cancel::CancellationToken;
pub use config::{Config, LogLevel, default_config_path, path_has_symlink_ancestor};
pub use errors::{FsError, Result};
pub use fs_ops::{
    DeleteOptions, RetryPolicy, delete_directory, delete_directory_with_retry, delete_file,
    delete_file_with_retry, delete_path, delete_path_with_retry, ensure_ancestors_readable,
    move_directory,
};
pub use path_algebra::{make_relative, parent_directory_name, resolve_path};
pub use platform::Platform;
