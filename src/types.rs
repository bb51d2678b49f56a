//! Core data types for bigview
//!
//! This module defines the small value types shared by the classifier,
//! the line cache, the viewport controller and the UI.

use std::ops::Range;

/// Byte offset in the backing file
pub type FilePos = u64;

/// Zero-based line index in the backing file
pub type LineNo = usize;

/// A contiguous, half-open range of line indices `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    /// First line in the window (inclusive)
    pub start: LineNo,
    /// One past the last line in the window (exclusive)
    pub end: LineNo,
}

impl LineWindow {
    pub fn new(start: LineNo, end: LineNo) -> Self {
        debug_assert!(start <= end, "line window start {} after end {}", start, end);
        Self { start, end }
    }

    /// Number of lines covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the window covers no lines
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a line falls within this window
    pub fn contains(&self, line: LineNo) -> bool {
        line >= self.start && line < self.end
    }

    /// Check if another window lies entirely within this one
    pub fn covers(&self, other: &LineWindow) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Returns the window as a range of line indices
    pub fn as_range(&self) -> Range<LineNo> {
        self.start..self.end
    }
}

/// A recorded line start: line `line` begins at byte `offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub line: LineNo,
    pub offset: FilePos,
}

impl Checkpoint {
    pub fn new(line: LineNo, offset: FilePos) -> Self {
        Self { line, offset }
    }

    /// The start of every file
    pub fn origin() -> Self {
        Self::new(0, 0)
    }
}

/// Outcome of classifying a file by size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileClass {
    /// Byte length at classification time
    pub size_bytes: u64,
    /// Whether the file must go through the windowed path
    pub is_large: bool,
}

/// What the viewport hands to the rendering side after every move
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportText {
    /// Up to `viewport_height` lines joined with '\n'
    pub content: String,
    /// First visible line (zero-based)
    pub current_line: LineNo,
    /// Extent of the file
    pub total_lines: usize,
}

impl ViewportText {
    /// Number of lines carried in `content`
    pub fn line_count(&self) -> usize {
        if self.content.is_empty() {
            0
        } else {
            self.content.split('\n').count()
        }
    }
}

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Sidebar,
    Content,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Content,
            Focus::Content => Focus::Sidebar,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Focus::Sidebar => "SIDEBAR",
            Focus::Content => "MAIN",
        }
    }
}
