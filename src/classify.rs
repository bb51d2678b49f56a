//! Size classification for bigview
//!
//! Decides from byte length alone whether a file is shown through the
//! windowed line cache or read wholesale.

use crate::error::ViewError;
use crate::types::FileClass;
use std::fs;
use std::path::Path;

/// Default threshold above which a file is considered large (1 MiB)
pub const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024;

/// Classify a size against a threshold. Line count plays no part.
pub fn classify_size(size_bytes: u64, threshold: u64) -> FileClass {
    FileClass {
        size_bytes,
        is_large: size_bytes > threshold,
    }
}

/// Stat `path` and classify it
pub fn classify(path: &Path, threshold: u64) -> Result<FileClass, ViewError> {
    let metadata = fs::metadata(path).map_err(|source| ViewError::Classify {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(classify_size(metadata.len(), threshold))
}
