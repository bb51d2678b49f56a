//! Log setup for bigview
//!
//! The terminal belongs to the TUI, so events go to a plain-text file in the
//! user's cache directory. The filter comes from `BIGVIEW_LOG` (for example
//! `BIGVIEW_LOG=bigview=debug`) and defaults to `warn`.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "BIGVIEW_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Where the log file lives
pub fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("bigview").join("bigview.log"))
}

/// Build the filter from `BIGVIEW_LOG`, falling back to the default
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to [`log_path`]
pub fn init() -> Result<PathBuf> {
    let path = log_path().context("Could not determine cache directory")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_namespaced() {
        if let Some(path) = log_path() {
            assert!(path.ends_with("bigview/bigview.log"));
        }
    }
}
