//! Viewport management for bigview
//!
//! This module maps scroll intents (line step, page, jump to either end)
//! onto the first visible line of a [`FileViewSession`] and pulls the lines
//! of one viewport out of the session's line cache.

use crate::error::ViewError;
use crate::session::FileViewSession;
use crate::types::{LineNo, ViewportText};
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum line length to display (prevents UI lock on huge lines)
pub const MAX_LINE_DISPLAY_WIDTH: usize = 4096;

/// Lines repeated between consecutive pages
pub const DEFAULT_PAGE_OVERLAP: usize = 2;

/// Largest valid first line for a viewport of `height` rows
pub fn max_first_line(total_lines: usize, height: usize) -> LineNo {
    total_lines.saturating_sub(height)
}

/// Distance covered by one page; always at least one line
pub fn page_step(height: usize, overlap: usize) -> usize {
    height.saturating_sub(overlap).max(1)
}

/// Move `current` down by `step`, stopping exactly at the bottom bound
pub fn step_down(current: LineNo, step: usize, total_lines: usize, height: usize) -> LineNo {
    current
        .saturating_add(step)
        .min(max_first_line(total_lines, height))
}

/// Move `current` up by `step`, stopping exactly at line 0
pub fn step_up(current: LineNo, step: usize) -> LineNo {
    current.saturating_sub(step)
}

/// Translates scroll intents into viewport content for a session
#[derive(Debug, Clone, Copy)]
pub struct ViewportController {
    page_overlap: usize,
}

impl ViewportController {
    pub fn new(page_overlap: usize) -> Self {
        Self { page_overlap }
    }

    pub fn page_overlap(&self) -> usize {
        self.page_overlap
    }

    /// One line up; no-op at the top
    pub fn scroll_up(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let target = step_up(session.current_line(), 1);
        self.move_to(session, target)
    }

    /// One line down; no-op at the bottom bound
    pub fn scroll_down(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let target = step_down(
            session.current_line(),
            1,
            session.total_lines(),
            session.viewport_height(),
        );
        self.move_to(session, target)
    }

    /// One page up, keeping `page_overlap` lines of the previous page
    pub fn page_up(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let step = page_step(session.viewport_height(), self.page_overlap);
        let target = step_up(session.current_line(), step);
        self.move_to(session, target)
    }

    /// One page down, keeping `page_overlap` lines of the previous page
    pub fn page_down(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let step = page_step(session.viewport_height(), self.page_overlap);
        let target = step_down(
            session.current_line(),
            step,
            session.total_lines(),
            session.viewport_height(),
        );
        self.move_to(session, target)
    }

    pub fn go_to_top(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        self.move_to(session, 0)
    }

    pub fn go_to_bottom(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let target = session.max_first_line();
        self.move_to(session, target)
    }

    /// Content at the current position (first view, resize)
    pub fn refresh(&self, session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
        let current = session.current_line();
        self.move_to(session, current)
    }

    /// Move to `target` and fetch its content; the old position is restored on failure
    fn move_to(
        &self,
        session: &mut FileViewSession,
        target: LineNo,
    ) -> Result<ViewportText, ViewError> {
        let previous = session.current_line();
        session.set_current_line(target);

        match viewport_content(session) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    path = %session.path().display(),
                    target,
                    error = %e,
                    "viewport fetch failed, keeping previous position"
                );
                session.set_current_line(previous);
                Err(e)
            }
        }
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_OVERLAP)
    }
}

/// Lines `[current_line, current_line + viewport_height)` joined with '\n'.
///
/// Fewer lines come back at the end of the file; a zero-height viewport or
/// an empty file yields empty content without touching the file.
fn viewport_content(session: &mut FileViewSession) -> Result<ViewportText, ViewError> {
    let current = session.current_line();
    let height = session.viewport_height();
    let total_lines = session.total_lines();

    let content = if height == 0 || total_lines == 0 {
        String::new()
    } else {
        let end = current.saturating_add(height);
        session.ensure_lines_in_cache(current, end)?;
        session.cached_lines(current, end).join("\n")
    };

    Ok(ViewportText {
        content,
        current_line: current,
        total_lines,
    })
}

/// Cut a line to at most `max_graphemes` grapheme clusters, marking the cut
pub fn clip_line(line: &str, max_graphemes: usize) -> String {
    if line.len() <= max_graphemes {
        return line.to_string();
    }
    if line.graphemes(true).nth(max_graphemes).is_none() {
        // Fits after all; byte length overstated it
        return line.to_string();
    }
    // No room for a marker
    if max_graphemes <= 3 {
        return line.graphemes(true).take(max_graphemes).collect();
    }
    let head: String = line.graphemes(true).take(max_graphemes - 3).collect();
    format!("{}...", head)
}

/// Get the display width of a string (accounting for wide characters)
pub fn display_width(s: &str) -> usize {
    use unicode_width::UnicodeWidthStr;
    s.width()
}
