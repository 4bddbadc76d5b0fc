//! XML configuration support.
//! Loads settings from config.xml (quick_xml + serde). A missing file means
//! defaults; a malformed file or an unknown field is an error, so typos
//! surface instead of being silently ignored.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    workers: Option<u64>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    continue_on_error: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    retry_backoff_ms: Option<u64>,
}

// Custom deserializers that trim surrounding whitespace
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u64>().ok()))
}

fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<bool>().ok()))
}

// Map XmlConfig -> Config; absent or unparsable values keep defaults.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| LogLevel::parse(s.trim()))
    {
        cfg.log_level = level;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    cfg.workers = parsed
        .workers
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok());
    if let Some(flag) = parsed.continue_on_error {
        cfg.continue_on_error = flag;
    }
    if let Some(ms) = parsed.retry_backoff_ms {
        cfg.retry_backoff = Duration::from_millis(ms);
    }

    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Load the config from `explicit`, `$FS_LIFECYCLE_CONFIG`, or the default
/// location, in that order. A missing file yields defaults, except when the
/// path was given explicitly.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(p) = explicit {
        return load_config_from_xml_path(p);
    }
    match default_config_path() {
        Some(p) if p.exists() => {
            debug!(path = %p.display(), "loading config");
            load_config_from_xml_path(&p)
        }
        _ => Ok(Config::default()),
    }
}
