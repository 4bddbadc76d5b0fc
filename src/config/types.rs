//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::RETRY_BACKOFF_MS_DEFAULT;
use crate::fs_ops::{DeleteOptions, RetryPolicy};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Delete worker threads; None = available parallelism
    pub workers: Option<usize>,
    /// Keep deleting when a single entry fails
    pub continue_on_error: bool,
    /// Pause unit between retry attempts
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            workers: None,
            continue_on_error: false,
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS_DEFAULT),
        }
    }
}

impl Config {
    /// Deletion options derived from this config.
    pub fn delete_options(&self, contents_only: bool) -> DeleteOptions {
        DeleteOptions {
            contents_only,
            continue_on_error: self.continue_on_error,
            workers: self.workers,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_backoff)
    }
}
