//! TUI (Terminal User Interface) for bigview
//!
//! A sidebar listing the browsed folder, a content panel showing the selected
//! file, a status bar and a shortcut bar, drawn with ratatui and crossterm.

use crate::browser::{Browser, ItemContent, Scroll};
use crate::types::Focus;
use crate::viewport::clip_line;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

/// Sidebar never grows beyond this many columns
const MAX_SIDEBAR_WIDTH: u16 = 40;

/// Help text content
const HELP_TEXT: &str = r#"
bigview - Browse and scroll through very large text files

Sidebar:
  Up/Down       Select item
  Enter         Open folder / focus content
  Tab           Switch panel

Content:
  Up/Down       Scroll one line
  PgUp/PgDn     Page up/down (2 lines overlap)
  Home/End      Go to top/bottom
  Esc           Back to sidebar

General:
  F5 / Ctrl+R   Refresh listing
  F1 / ?        Show this help
  q / Ctrl+C    Quit

Files above the large-file threshold are never read whole: only a window
of lines around the visible area is kept in memory.

Press any key to close this help...
"#;

/// Screen regions for one frame
#[derive(Debug, Clone, Copy)]
struct Panels {
    header: Rect,
    sidebar: Rect,
    main: Rect,
    status: Rect,
    help: Rect,
}

fn split(area: Rect) -> Panels {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Sidebar + content
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    let sidebar_width = (rows[1].width / 3).min(MAX_SIDEBAR_WIDTH);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
        .split(rows[1]);

    Panels {
        header: rows[0],
        sidebar: columns[0],
        main: columns[1],
        status: rows[2],
        help: rows[3],
    }
}

/// The TUI application
pub struct App {
    pub browser: Browser,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    should_quit: bool,
    focus: Focus,
    show_help: bool,
    max_line_width: usize,
    status_message: Option<String>,
}

impl App {
    /// Take over the terminal and show `browser`
    pub fn new(browser: Browser, max_line_width: usize) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            browser,
            terminal,
            should_quit: false,
            focus: Focus::Sidebar,
            show_help: false,
            max_line_width,
            status_message: None,
        })
    }

    /// Run the main event loop
    pub fn run(&mut self) -> Result<()> {
        while !self.should_quit {
            self.draw()?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Draw the UI
    fn draw(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        let panels = split(Rect::new(0, 0, size.width, size.height));

        // The content panel height decides the viewport before anything is fetched
        self.browser.set_surface_rows(panels.main.height as usize);

        let browser = &self.browser;
        let focus = self.focus;
        let show_help = self.show_help;
        let max_line_width = self.max_line_width;
        let status_message = self.status_message.as_deref();

        self.terminal.draw(|frame| {
            draw_header(frame, browser, panels.header);
            draw_sidebar(frame, browser, focus, panels.sidebar);
            if show_help {
                draw_help_screen(frame, panels.main);
            } else {
                draw_content(frame, browser, focus, max_line_width, panels.main);
            }
            draw_status_bar(frame, browser, focus, status_message, panels.status);
            draw_help_bar(frame, browser, focus, panels.help);
        })?;

        Ok(())
    }

    /// Handle input events
    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key)?;
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.show_help {
            self.show_help = false;
            return Ok(());
        }

        self.status_message = None;

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => self.should_quit = true,

            (_, KeyCode::F(1)) | (_, KeyCode::Char('?')) => self.show_help = true,

            (KeyModifiers::NONE, KeyCode::Tab) => self.focus = self.focus.toggle(),

            (KeyModifiers::NONE, KeyCode::F(5)) | (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                self.status_message = Some(match self.browser.refresh() {
                    Ok(()) => "Refreshed".to_string(),
                    Err(e) => format!("{:#}", e),
                });
            }

            (KeyModifiers::NONE, KeyCode::PageUp) => self.browser.scroll(Scroll::PageUp),
            (KeyModifiers::NONE, KeyCode::PageDown) => self.browser.scroll(Scroll::PageDown),
            (KeyModifiers::NONE, KeyCode::Home) => self.browser.scroll(Scroll::Top),
            (KeyModifiers::NONE, KeyCode::End) => self.browser.scroll(Scroll::Bottom),

            (KeyModifiers::NONE, code) => match self.focus {
                Focus::Sidebar => self.handle_sidebar_key(code),
                Focus::Content => self.handle_content_key(code),
            },

            _ => {}
        }
        Ok(())
    }

    fn handle_sidebar_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.browser.select_previous(),
            KeyCode::Down => self.browser.select_next(),
            KeyCode::Enter => match self.browser.enter() {
                Ok(true) => {}
                // A file: move over to its content
                Ok(false) => self.focus = Focus::Content,
                Err(e) => self.status_message = Some(format!("{:#}", e)),
            },
            _ => {}
        }
    }

    fn handle_content_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.browser.scroll(Scroll::LineUp),
            KeyCode::Down => self.browser.scroll(Scroll::LineDown),
            KeyCode::Esc => self.focus = Focus::Sidebar,
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal
        let _ = terminal::disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
    }
}

fn draw_header(frame: &mut ratatui::Frame, browser: &Browser, area: Rect) {
    let location = browser.root().join(browser.current_dir());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" bigview {} ", env!("CARGO_PKG_VERSION")),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}", location.display())),
    ]));
    frame.render_widget(header, area);
}

fn panel_block(title: String, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

fn draw_sidebar(frame: &mut ratatui::Frame, browser: &Browser, focus: Focus, area: Rect) {
    let items: Vec<ListItem> = browser
        .items()
        .iter()
        .map(|item| {
            if item.is_folder {
                ListItem::new(format!("📁 {}", item.name)).style(Style::default().fg(Color::Yellow))
            } else {
                ListItem::new(format!("  {}", item.name))
            }
        })
        .collect();

    let list = List::new(items)
        .block(panel_block(" Files ".to_string(), focus == Focus::Sidebar))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(Some(browser.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_content(
    frame: &mut ratatui::Frame,
    browser: &Browser,
    focus: Focus,
    max_line_width: usize,
    area: Rect,
) {
    // Clear the area first to prevent rendering artifacts
    frame.render_widget(Clear, area);

    let title = match (browser.content(), browser.line_position()) {
        (ItemContent::Large { .. }, Some((current, total))) => format!(
            " Large File (Line {}/{}) - ↑/↓ scroll, PgUp/PgDn page, Home/End top/bottom ",
            current + 1,
            total
        ),
        (ItemContent::Text(text), _) => format!(" View ({} lines) ", text.total_lines()),
        _ => " View ".to_string(),
    };

    let text = browser.content_text();
    let lines: Vec<Line> = text
        .split('\n')
        .map(|line| Line::from(clip_line(line, max_line_width)))
        .collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(panel_block(title, focus == Focus::Content));
    frame.render_widget(paragraph, area);
}

fn draw_help_screen(frame: &mut ratatui::Frame, area: Rect) {
    frame.render_widget(Clear, area);
    let help = Paragraph::new(HELP_TEXT)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

/// Draw the status bar
fn draw_status_bar(
    frame: &mut ratatui::Frame,
    browser: &Browser,
    focus: Focus,
    status_message: Option<&str>,
    area: Rect,
) {
    let item_name = browser
        .selected_item()
        .map(|item| item.name.as_str())
        .unwrap_or("N/A");

    let line_info = match browser.line_position() {
        Some((current, total)) => format!(
            " | Line: {}/{} | {}",
            current + 1,
            total,
            browser.session().map(|s| format_size(s.size_bytes())).unwrap_or_default()
        ),
        None => String::new(),
    };

    let status = match (status_message, browser.last_error()) {
        (Some(msg), _) => msg.to_string(),
        (None, Some(err)) => format!("Error: {}", err),
        (None, None) => format!(
            "Mode: VIEW | Panel: {} | Item: {} | Items: {}{}",
            focus.label(),
            item_name,
            browser.items().len(),
            line_info
        ),
    };

    let status_bar = Paragraph::new(Line::from(vec![Span::styled(
        format!(" {:<width$}", status, width = (area.width as usize).saturating_sub(1)),
        Style::default().fg(Color::Black).bg(Color::White),
    )]));

    frame.render_widget(status_bar, area);
}

/// Draw the help/shortcut bar
fn draw_help_bar(frame: &mut ratatui::Frame, browser: &Browser, focus: Focus, area: Rect) {
    let mut shortcuts = match focus {
        Focus::Sidebar => vec![("↑/↓", "Select"), ("Enter", "Open"), ("Tab", "Content")],
        Focus::Content => vec![("↑/↓", "Scroll"), ("Esc", "Sidebar"), ("Tab", "Sidebar")],
    };
    if browser.session().is_some() {
        shortcuts.extend([("PgUp/PgDn", "Page"), ("Home/End", "Top/Bottom")]);
    }
    shortcuts.extend([("F5", "Refresh"), ("F1", "Help"), ("q", "Quit")]);

    let spans: Vec<Span> = shortcuts
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!(" {} ", key),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} ", desc), Style::default().fg(Color::White)),
            ]
        })
        .collect();

    let help_bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    frame.render_widget(help_bar, area);
}

/// Format a byte size as human-readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn test_split_layout() {
        let panels = split(Rect::new(0, 0, 120, 40));
        assert_eq!(panels.header.height, 1);
        assert_eq!(panels.status.height, 1);
        assert_eq!(panels.help.height, 1);
        assert_eq!(panels.main.height, 37);
        assert_eq!(panels.sidebar.width, 40);
        assert_eq!(panels.main.width, 80);

        // Narrow terminals shrink the sidebar
        let narrow = split(Rect::new(0, 0, 60, 20));
        assert_eq!(narrow.sidebar.width, 20);
    }
}
