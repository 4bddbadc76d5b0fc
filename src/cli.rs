//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Global flags override values loaded from the XML config.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Create, move and reliably destroy directory trees"
)]
pub struct Args {
    /// Explicit config file (overrides FS_LIFECYCLE_CONFIG and the default location).
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Delete a file or directory tree (no-op if absent).
    Delete {
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Keep the directory itself, remove everything inside it.
        #[arg(long)]
        contents_only: bool,
        /// Keep going when a single entry cannot be deleted.
        #[arg(long)]
        continue_on_error: bool,
        /// Fail on the first transient error instead of retrying.
        #[arg(long)]
        no_retry: bool,
        /// Number of delete worker threads (default: available parallelism).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Check that every ancestor directory is readable before deleting.
        #[arg(long)]
        check_permissions: bool,
        /// Pause unit between retry attempts, in milliseconds.
        #[arg(long, value_name = "MS")]
        retry_backoff_ms: Option<u64>,
    },
    /// Move a directory tree via a staging directory.
    Move {
        #[arg(value_hint = ValueHint::DirPath)]
        source: PathBuf,
        #[arg(value_hint = ValueHint::DirPath)]
        target: PathBuf,
        #[arg(long, value_hint = ValueHint::DirPath)]
        staging: PathBuf,
    },
    /// Resolve RELATIVE against the absolute ROOT without leaving it.
    Resolve { root: String, relative: String },
    /// Print PATH relative to FOLDER (or PATH unchanged when outside it).
    Relative { path: String, folder: String },
    /// Print the parent directory of PATH.
    Parent { path: String },
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if let Command::Delete {
            continue_on_error,
            workers,
            retry_backoff_ms,
            ..
        } = &self.command
        {
            if *continue_on_error {
                cfg.continue_on_error = true;
            }
            if let Some(n) = workers.filter(|n| *n > 0) {
                cfg.workers = Some(n);
            }
            if let Some(ms) = retry_backoff_ms {
                cfg.retry_backoff = Duration::from_millis(*ms);
            }
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
