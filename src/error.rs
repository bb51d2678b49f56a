//! Error taxonomy for the large-file view path
//!
//! Every variant degrades to "nothing to show for this item" at the browser
//! level; none of them is fatal to the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// Stat failed while deciding whether the file is large
    #[error("Failed to stat {}: {source}", path.display())]
    Classify {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The one-time line count failed
    #[error("Failed to count lines in {}: {source}", path.display())]
    CountLines {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The read handle for the session could not be opened
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A cache rebuild was requested without an open handle
    #[error("file not open")]
    FileNotOpen,

    /// Read or seek failed while rebuilding the line cache
    #[error("Failed to reload line cache: {0}")]
    Reload(#[from] io::Error),
}

impl ViewError {
    /// Short label for logs and the status bar
    pub fn kind(&self) -> &'static str {
        match self {
            ViewError::Classify { .. } => "classify",
            ViewError::CountLines { .. } => "count",
            ViewError::Open { .. } => "open",
            ViewError::FileNotOpen => "not-open",
            ViewError::Reload(_) => "reload",
        }
    }
}
