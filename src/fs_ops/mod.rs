//! Filesystem lifecycle operations: walk, delete, retry, staged move.

mod atomic;
mod delete;
mod permissions;
mod plan;
mod retry;
mod staged_move;
mod walk;

pub use delete::{DeleteOptions, delete_directory, delete_file, delete_path};
pub use permissions::ensure_ancestors_readable;
pub use plan::DeletionPlan;
pub use retry::{
    MAX_ATTEMPTS, RetryPolicy, delete_directory_with_retry, delete_file_with_retry,
    delete_path_with_retry, retry,
};
pub use staged_move::move_directory;
pub use walk::{Attributes, FsEntry, TreeWalker, walk_tree};
