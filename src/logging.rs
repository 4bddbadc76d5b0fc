//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel (no RUST_LOG override here).
//! - Console logs go to stderr so stdout stays clean for command results.
//! - If `log_file` is provided and passes safety checks, a non-blocking file layer is added.
//!
//! Implementation notes:
//! - File logging uses tracing_appender::non_blocking to avoid blocking on I/O.
//! - We refuse file logging if any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use fs_lifecycle::output as out;
use fs_lifecycle::platform::open_log_file_secure_append;
use fs_lifecycle::{LogLevel, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

/// Try to open a non-blocking file writer for logging:
/// - Refuse if any ancestor is a symlink (prints a warning and returns None)
/// - Open file for append and wrap with non_blocking
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            out::print_warn(&format!(
                "Refusing to enable file logging: ancestor of {} is a symlink.",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "Error checking log path {} for symlinks: {e}; proceeding without file logging.",
                path.display()
            ));
            return None;
        }
        Ok(false) => {}
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!("Failed to open log file {}: {e}", path.display()));
            None
        }
    }
}

/// One formatting layer, JSON or compact, over any writer.
fn fmt_layer<S, W>(json: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
    W: for<'w> tsfmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        tsfmt::layer()
            .json()
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed()
    } else {
        tsfmt::layer()
            .compact()
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed()
    }
}

/// Initialize tracing based on LogLevel and format. Returns an optional WorkerGuard
/// if a file appender is created (must be held until shutdown to flush logs).
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::default().add_directive(to_level_filter(lvl).into());

    let file = log_file.and_then(|p| {
        let opened = maybe_open_non_blocking_writer(p);
        if opened.is_none() {
            out::print_warn(&format!(
                "Requested file logging to '{}' was not enabled. Logs will continue to stderr.",
                p.display()
            ));
        }
        opened
    });

    match file {
        Some((writer, guard)) => {
            registry()
                .with(env_filter)
                .with(fmt_layer(json, std::io::stderr))
                .with(fmt_layer(json, writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry()
                .with(env_filter)
                .with(fmt_layer(json, std::io::stderr))
                .try_init()?;
            Ok(None)
        }
    }
}
