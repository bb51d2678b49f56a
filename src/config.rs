//! Configuration management for bigview
//!
//! Loads user preferences from ~/.config/bigview/config.toml

use crate::cache::DEFAULT_CACHE_LINES;
use crate::classify::LARGE_FILE_THRESHOLD;
use crate::viewport::{DEFAULT_PAGE_OVERLAP, MAX_LINE_DISPLAY_WIDTH};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default config file contents
const DEFAULT_CONFIG: &str = r#"# bigview configuration file
# Location: ~/.config/bigview/config.toml

[viewer]
# Files larger than this many bytes are scrolled through a line cache
# instead of being read into memory
large_file_threshold = 1048576  # 1 MiB

# Lines kept in memory around the visible area (half before, half after)
cache_lines = 1000

# Viewport height used until the terminal reports its size
default_viewport = 30

# Lines repeated between consecutive pages
page_overlap = 2

# Rows taken by the content panel border
border_rows = 2

# Longer lines are cut off when displayed
max_line_width = 4096

[index]
# How the line cache is rebuilt when scrolling leaves the cached window:
# - "rescan": read from the start of the file every time (simple, slow near the end)
# - "sparse": remember every `stride`-th line offset while counting lines
#             and start reading from the closest one
strategy = "rescan"
stride = 1024

[browser]
# List files and folders whose names start with '.'
show_hidden = false
"#;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub index: IndexConfig,
    pub browser: BrowserConfig,
}

/// Large-file viewing preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Files strictly larger than this (bytes) use the line cache
    pub large_file_threshold: u64,
    /// Lines cached around the viewport
    pub cache_lines: usize,
    /// Viewport height before the first resize report
    pub default_viewport: usize,
    /// Lines shared between consecutive pages
    pub page_overlap: usize,
    /// Rows consumed by the content panel border
    pub border_rows: usize,
    /// Display truncation width
    pub max_line_width: usize,
}

/// Cache rebuild strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// Rescan from byte 0 on every miss
    #[default]
    Rescan,
    /// Seek to a recorded checkpoint on every miss
    Sparse,
}

/// Line index preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub strategy: IndexStrategy,
    /// Lines between checkpoints in sparse mode
    pub stride: usize,
}

/// Directory listing preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub show_hidden: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: LARGE_FILE_THRESHOLD,
            cache_lines: DEFAULT_CACHE_LINES,
            default_viewport: 30,
            page_overlap: DEFAULT_PAGE_OVERLAP,
            border_rows: 2,
            max_line_width: MAX_LINE_DISPLAY_WIDTH,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            strategy: IndexStrategy::Rescan,
            stride: 1024,
        }
    }
}

impl IndexConfig {
    /// Checkpoint stride to record during the line count, if any
    pub fn sparse_stride(&self) -> Option<usize> {
        match self.strategy {
            IndexStrategy::Rescan => None,
            IndexStrategy::Sparse => Some(self.stride.max(1)),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bigview").join("config.toml"))
    }

    /// Load config from file, or return defaults
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Try to load config from file
    pub fn try_load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Create default config file if it doesn't exist
    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write default config: {}", path.display()))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.viewer.large_file_threshold, 1024 * 1024);
        assert_eq!(config.viewer.cache_lines, 1000);
        assert_eq!(config.viewer.page_overlap, 2);
        assert_eq!(config.index.strategy, IndexStrategy::Rescan);
        assert_eq!(config.index.sparse_stride(), None);
        assert!(!config.browser.show_hidden);
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let parsed = Config::parse(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.viewer.large_file_threshold, defaults.viewer.large_file_threshold);
        assert_eq!(parsed.viewer.cache_lines, defaults.viewer.cache_lines);
        assert_eq!(parsed.viewer.default_viewport, defaults.viewer.default_viewport);
        assert_eq!(parsed.viewer.border_rows, defaults.viewer.border_rows);
        assert_eq!(parsed.viewer.max_line_width, defaults.viewer.max_line_width);
        assert_eq!(parsed.index.strategy, defaults.index.strategy);
        assert_eq!(parsed.index.stride, defaults.index.stride);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[viewer]
large_file_threshold = 4096
cache_lines = 200

[index]
strategy = "sparse"
stride = 64
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.viewer.large_file_threshold, 4096);
        assert_eq!(config.viewer.cache_lines, 200);
        // Unset keys keep their defaults
        assert_eq!(config.viewer.page_overlap, 2);
        assert_eq!(config.index.sparse_stride(), Some(64));
    }

    #[test]
    fn test_zero_stride_is_clamped() {
        let config = Config::parse("[index]\nstrategy = \"sparse\"\nstride = 0\n").unwrap();
        assert_eq!(config.index.sparse_stride(), Some(1));
    }

    #[test]
    fn test_bad_strategy_is_rejected() {
        assert!(Config::parse("[index]\nstrategy = \"btree\"\n").is_err());
    }
}
