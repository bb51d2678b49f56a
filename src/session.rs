//! View session for one large file
//!
//! A session exists while a large file is selected. It owns the read handle,
//! the line extent computed when it was opened, the first visible line and
//! the line cache. Dropping the session closes the handle.

use crate::cache::{CacheStats, LineCache};
use crate::classify::classify;
use crate::config::Config;
use crate::error::ViewError;
use crate::extent::{count_lines, LineIndex};
use crate::types::{FileClass, LineNo};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Knobs a session needs, resolved from [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub large_file_threshold: u64,
    pub cache_lines: usize,
    pub default_viewport: usize,
    pub border_rows: usize,
    /// Record a sparse line index with this stride
    pub index_stride: Option<usize>,
    /// Bytes of each line kept in the cache
    pub max_line_bytes: usize,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            large_file_threshold: config.viewer.large_file_threshold,
            cache_lines: config.viewer.cache_lines,
            default_viewport: config.viewer.default_viewport,
            border_rows: config.viewer.border_rows,
            index_stride: config.index.sparse_stride(),
            max_line_bytes: config.viewer.max_line_width,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Scroll and cache state for the currently selected large file
#[derive(Debug)]
pub struct FileViewSession {
    path: PathBuf,
    size_bytes: u64,
    total_lines: usize,
    current_line: LineNo,
    viewport_height: usize,
    border_rows: usize,
    cache: LineCache,
    index: Option<LineIndex>,
    /// Read handle; None once closed
    file: Option<File>,
}

impl FileViewSession {
    /// Classify `path` and open a session if it is large.
    ///
    /// Returns `Ok(None)` for files at or below the threshold.
    pub fn open_if_large(path: &Path, options: &SessionOptions) -> Result<Option<Self>, ViewError> {
        let class = classify(path, options.large_file_threshold)?;
        if !class.is_large {
            return Ok(None);
        }
        Self::open(path, class, options).map(Some)
    }

    /// Open a session on an already classified file and count its lines
    pub fn open(path: &Path, class: FileClass, options: &SessionOptions) -> Result<Self, ViewError> {
        let mut file = File::open(path).map_err(|source| ViewError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let extent = count_lines(&mut file, options.index_stride).map_err(|source| {
            ViewError::CountLines {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!(
            path = %path.display(),
            size_bytes = class.size_bytes,
            total_lines = extent.total_lines,
            checkpoints = extent.index.as_ref().map(LineIndex::len).unwrap_or(0),
            "opened large file session"
        );

        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: class.size_bytes,
            total_lines: extent.total_lines,
            current_line: 0,
            viewport_height: options.default_viewport,
            border_rows: options.border_rows,
            cache: LineCache::new(options.cache_lines).with_max_line_bytes(options.max_line_bytes),
            index: extent.index,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn current_line(&self) -> LineNo {
        self.current_line
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn cache(&self) -> &LineCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Largest valid first line for the current viewport height
    pub fn max_first_line(&self) -> LineNo {
        self.total_lines.saturating_sub(self.viewport_height)
    }

    /// Set the number of content rows and re-clamp the first line
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        self.set_current_line(self.current_line);
    }

    /// Take the renderer's reported surface height, minus the border rows
    pub fn set_surface_rows(&mut self, rows: usize) {
        self.set_viewport_height(rows.saturating_sub(self.border_rows));
    }

    /// Move the first visible line, clamped to `[0, max_first_line]`
    pub fn set_current_line(&mut self, line: LineNo) {
        self.current_line = line.min(self.max_first_line());
    }

    /// Make lines `[lo, hi)` (clamped to the extent) available in the cache
    pub fn ensure_lines_in_cache(&mut self, lo: LineNo, hi: LineNo) -> Result<(), ViewError> {
        let file = self.file.as_mut().ok_or(ViewError::FileNotOpen)?;
        self.cache
            .ensure_lines(file, self.total_lines, lo, hi, self.index.as_ref())?;
        Ok(())
    }

    /// Cached text of the lines in `[lo, hi)`
    pub fn cached_lines(&self, lo: LineNo, hi: LineNo) -> &[String] {
        self.cache.slice(lo, hi)
    }

    /// Release the read handle and the cached lines
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            info!(path = %self.path.display(), "closed large file session");
        }
        self.cache.invalidate();
    }
}
