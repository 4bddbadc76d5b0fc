//! Cooperative cancellation.
//!
//! A `CancellationToken` is a shared one-way "stop" flag. Tokens can be linked:
//! a child reports cancelled when it or any ancestor is cancelled, while
//! cancelling the child leaves the parent untouched. The deletion engine uses
//! one child per invocation so a worker failure can stop the walk without
//! cancelling the caller.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way flag.
//! - `cancel()` is idempotent and safe from any thread (including a Ctrl-C handler).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::errors::{FsError, Result};

/// Granularity of `sleep`; bounds how late a cancellation is noticed while backing off.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token linked to `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Request cancellation (idempotent).
    #[inline]
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(token) = current {
            if token.inner.cancelled.load(Ordering::Relaxed) {
                return true;
            }
            current = token.inner.parent.as_ref();
        }
        false
    }

    /// `Err(Cancelled)` once the token has fired.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FsError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `duration`, returning early with `Cancelled` if the token fires.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}
