//! Directory browser for bigview
//!
//! Lists a root directory, tracks the selected item and loads what the
//! content panel shows for it. Small files are read wholesale; large files
//! get a [`FileViewSession`] scrolled through a [`ViewportController`].
//! Every load failure degrades to empty content.

use crate::config::Config;
use crate::error::ViewError;
use crate::session::{FileViewSession, SessionOptions};
use crate::types::{LineNo, ViewportText};
use crate::viewport::{max_first_line, page_step, step_down, step_up, ViewportController};
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One entry in the sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Name shown in the sidebar
    pub name: String,
    /// Path relative to the browser root
    pub path: PathBuf,
    pub is_folder: bool,
    /// The ".." entry leading to the parent folder
    pub is_parent: bool,
}

/// A small file held in memory, scrolled by line offset
#[derive(Debug, Clone, Default)]
pub struct TextView {
    lines: Vec<String>,
    offset: LineNo,
    height: usize,
}

impl TextView {
    pub fn new(text: &str, height: usize) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            offset: 0,
            height,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn offset(&self) -> LineNo {
        self.offset
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.offset = self.offset.min(max_first_line(self.lines.len(), height));
    }

    pub fn scroll_up(&mut self) {
        self.offset = step_up(self.offset, 1);
    }

    pub fn scroll_down(&mut self) {
        self.offset = step_down(self.offset, 1, self.lines.len(), self.height);
    }

    pub fn page_up(&mut self, overlap: usize) {
        self.offset = step_up(self.offset, page_step(self.height, overlap));
    }

    pub fn page_down(&mut self, overlap: usize) {
        let step = page_step(self.height, overlap);
        self.offset = step_down(self.offset, step, self.lines.len(), self.height);
    }

    pub fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.offset = max_first_line(self.lines.len(), self.height);
    }

    /// Visible lines, joined with '\n'
    pub fn visible(&self) -> String {
        let end = self.offset.saturating_add(self.height).min(self.lines.len());
        if self.offset >= end {
            return String::new();
        }
        self.lines[self.offset..end].join("\n")
    }
}

/// What the content panel holds for the selected item
#[derive(Debug, Default)]
pub enum ItemContent {
    /// Folder, empty selection or a failed load
    #[default]
    Empty,
    /// Small file read wholesale
    Text(TextView),
    /// Large file scrolled through the line cache
    Large {
        session: FileViewSession,
        view: ViewportText,
    },
}

/// Scroll intents routed to whichever content is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// The sidebar listing and the content of its selected item
#[derive(Debug)]
pub struct Browser {
    root: PathBuf,
    /// Current folder, relative to root
    current_dir: PathBuf,
    items: Vec<Item>,
    selected: usize,
    show_hidden: bool,
    options: SessionOptions,
    controller: ViewportController,
    content: ItemContent,
    /// Content rows last reported by the UI, border included
    surface_rows: Option<usize>,
    /// Last load or scroll failure, for the status bar
    last_error: Option<String>,
}

impl Browser {
    /// Open a browser on `root` with nothing selected yet
    pub fn open(root: &Path, config: &Config) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Cannot open directory {}", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let mut browser = Self {
            root,
            current_dir: PathBuf::new(),
            items: Vec::new(),
            selected: 0,
            show_hidden: config.browser.show_hidden,
            options: SessionOptions::from_config(config),
            controller: ViewportController::new(config.viewer.page_overlap),
            content: ItemContent::Empty,
            surface_rows: None,
            last_error: None,
        };
        browser.refresh()?;
        Ok(browser)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The active large-file session, if any
    pub fn session(&self) -> Option<&FileViewSession> {
        match &self.content {
            ItemContent::Large { session, .. } => Some(session),
            _ => None,
        }
    }

    /// `(current_line, total_lines)` for the status bar, large files only
    pub fn line_position(&self) -> Option<(LineNo, usize)> {
        match &self.content {
            ItemContent::Large { view, .. } => Some((view.current_line, view.total_lines)),
            _ => None,
        }
    }

    /// Text for the content panel
    pub fn content_text(&self) -> Cow<'_, str> {
        match &self.content {
            ItemContent::Empty => Cow::Borrowed(""),
            ItemContent::Text(text) => Cow::Owned(text.visible()),
            ItemContent::Large { view, .. } => Cow::Borrowed(&view.content),
        }
    }

    /// Re-read the current folder and reload the selected item.
    ///
    /// The selection follows the selected path; only if that entry is gone
    /// does it fall back to the same index, clamped to the new listing.
    pub fn refresh(&mut self) -> Result<()> {
        let selected_path = self.selected_item().map(|item| item.path.clone());
        self.items = list_items(
            &self.root.join(&self.current_dir),
            &self.current_dir,
            self.show_hidden,
        )?;

        match selected_path.and_then(|path| self.items.iter().position(|item| item.path == path)) {
            Some(idx) => self.selected = idx,
            None => self.selected = self.selected.min(self.items.len().saturating_sub(1)),
        }
        self.load_current_item();
        Ok(())
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
            self.load_current_item();
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.load_current_item();
        }
    }

    /// Select the item whose file name is `name`
    pub fn select_name(&mut self, name: &str) -> bool {
        match self.items.iter().position(|item| item.name == name) {
            Some(idx) => {
                self.selected = idx;
                self.load_current_item();
                true
            }
            None => false,
        }
    }

    /// Enter the selected folder (or its parent). Returns false for files.
    pub fn enter(&mut self) -> Result<bool> {
        let Some(item) = self.selected_item().cloned() else {
            return Ok(false);
        };
        if !item.is_folder {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.current_dir, item.path);
        // Start the new folder at its first entry
        self.items.clear();
        self.selected = 0;
        if let Err(e) = self.refresh() {
            self.current_dir = previous;
            self.refresh()?;
            return Err(e);
        }
        Ok(true)
    }

    /// Rows available to the content panel (border included)
    pub fn set_surface_rows(&mut self, rows: usize) {
        if self.surface_rows == Some(rows) {
            return;
        }
        self.surface_rows = Some(rows);

        let controller = self.controller;
        let border_rows = self.options.border_rows;
        match &mut self.content {
            ItemContent::Empty => {}
            ItemContent::Text(text) => text.set_height(rows.saturating_sub(border_rows)),
            ItemContent::Large { session, view } => {
                session.set_surface_rows(rows);
                match controller.refresh(session) {
                    Ok(text) => *view = text,
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
        }
    }

    /// Apply a scroll intent to the active content
    pub fn scroll(&mut self, scroll: Scroll) {
        let controller = self.controller;
        let overlap = controller.page_overlap();
        match &mut self.content {
            ItemContent::Empty => {}
            ItemContent::Text(text) => match scroll {
                Scroll::LineUp => text.scroll_up(),
                Scroll::LineDown => text.scroll_down(),
                Scroll::PageUp => text.page_up(overlap),
                Scroll::PageDown => text.page_down(overlap),
                Scroll::Top => text.go_to_top(),
                Scroll::Bottom => text.go_to_bottom(),
            },
            ItemContent::Large { session, view } => {
                let result = match scroll {
                    Scroll::LineUp => controller.scroll_up(session),
                    Scroll::LineDown => controller.scroll_down(session),
                    Scroll::PageUp => controller.page_up(session),
                    Scroll::PageDown => controller.page_down(session),
                    Scroll::Top => controller.go_to_top(session),
                    Scroll::Bottom => controller.go_to_bottom(session),
                };
                // On failure the previous content stays on screen
                match result {
                    Ok(text) => *view = text,
                    Err(e) => self.last_error = Some(e.to_string()),
                }
            }
        }
    }

    /// Replace the content with whatever the selected item shows
    fn load_current_item(&mut self) {
        // The old session (and its handle) goes away before anything new opens
        self.content = ItemContent::Empty;
        self.last_error = None;

        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        if item.is_folder {
            return;
        }

        let path = self.root.join(&item.path);
        match self.load_file(&path) {
            Ok(content) => self.content = content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, kind = e.kind(), "nothing to show");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn load_file(&self, path: &Path) -> Result<ItemContent, ViewError> {
        match FileViewSession::open_if_large(path, &self.options)? {
            Some(mut session) => {
                if let Some(rows) = self.surface_rows {
                    session.set_surface_rows(rows);
                }
                let view = self.controller.refresh(&mut session)?;
                Ok(ItemContent::Large { session, view })
            }
            None => {
                let bytes = fs::read(path).map_err(|source| ViewError::Open {
                    path: path.to_path_buf(),
                    source,
                })?;
                let height = match self.surface_rows {
                    Some(rows) => rows.saturating_sub(self.options.border_rows),
                    None => self.options.default_viewport,
                };
                Ok(ItemContent::Text(TextView::new(
                    &String::from_utf8_lossy(&bytes),
                    height,
                )))
            }
        }
    }
}

/// List `dir`: a ".." entry unless at the root, then folders, then files,
/// each group sorted case-insensitively
fn list_items(dir: &Path, relative: &Path, show_hidden: bool) -> Result<Vec<Item>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
        .map(|entry| {
            entry.map(|entry| {
                let is_folder = entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
                    || entry.path().is_dir();
                (entry.file_name().to_string_lossy().into_owned(), is_folder)
            })
        });
    Ok(build_items(entries, relative, show_hidden))
}

/// Turn `(name, is_folder)` entries into sidebar items. Entries that could
/// not be read are skipped.
fn build_items<I>(entries: I, relative: &Path, show_hidden: bool) -> Vec<Item>
where
    I: IntoIterator<Item = io::Result<(String, bool)>>,
{
    let mut folders = Vec::new();
    let mut files = Vec::new();

    for entry in entries {
        let (name, is_folder) = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %relative.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        let item = Item {
            path: relative.join(&name),
            name,
            is_folder,
            is_parent: false,
        };
        if is_folder {
            folders.push(item);
        } else {
            files.push(item);
        }
    }

    folders.sort_by_key(|item| item.name.to_lowercase());
    files.sort_by_key(|item| item.name.to_lowercase());

    let mut items = Vec::with_capacity(folders.len() + files.len() + 1);
    if let Some(parent) = relative.parent().filter(|_| !relative.as_os_str().is_empty()) {
        items.push(Item {
            name: "..".to_string(),
            path: parent.to_path_buf(),
            is_folder: true,
            is_parent: true,
        });
    }
    items.extend(folders);
    items.extend(files);
    items
}
