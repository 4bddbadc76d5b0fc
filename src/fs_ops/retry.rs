//! Retry wrapper for deletions.
//! Re-runs an operation on transient (`Busy`) failures with linear backoff.
//!
//! - At most `MAX_ATTEMPTS` attempts.
//! - Cancellation is checked before every attempt and during every pause.
//! - Before attempt n+1 the wrapper waits `n * backoff_unit` (1s, then 2s by default).
//! - Any other failure, or the failure of the last attempt, is returned unchanged.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::errors::Result;

use super::delete::{DeleteOptions, delete_directory, delete_file};

pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause unit; the pause after attempt n is `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_unit: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(backoff_unit: Duration) -> Self {
        Self { backoff_unit }
    }

    #[inline]
    fn pause_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or runs out of attempts.
pub fn retry<T, F>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    loop {
        cancel.check()?;
        match op() {
            Ok(v) => {
                if attempt > 1 {
                    debug!(what, attempt, "succeeded after retry");
                }
                return Ok(v);
            }
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let pause = policy.pause_after(attempt);
                warn!(
                    what,
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    pause_ms = pause.as_millis() as u64,
                    error = %e,
                    "transient failure; retrying"
                );
                cancel.sleep(pause)?;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// `delete_directory` with retries on transient failures.
pub fn delete_directory_with_retry(
    path: &Path,
    opts: &DeleteOptions,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    retry(policy, cancel, "delete directory", || {
        delete_directory(path, opts, cancel)
    })
}

/// `delete_file` with retries on transient failures.
pub fn delete_file_with_retry(
    path: &Path,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    retry(policy, cancel, "delete file", || delete_file(path, cancel))
}

/// Combined delete (directory, then file) where each half is retried.
pub fn delete_path_with_retry(
    path: &Path,
    opts: &DeleteOptions,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    delete_directory_with_retry(path, opts, policy, cancel)?;
    if opts.contents_only {
        return Ok(());
    }
    delete_file_with_retry(path, policy, cancel)
}
