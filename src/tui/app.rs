//! Main application state for the TUI

use super::events::{key_handler, AppAction, Page};
use super::widgets::{ColorScheme, Popup, TreeView};
use crate::sync::SyncEngine;
use crate::tree::{build_tree, TreeCursor, TreeNode};
use crate::Config;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};
use std::path::PathBuf;

const MAX_LOG_LINES: usize = 1000;

/// Result line shown under the Add form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
}

/// Application state
pub struct App {
    engine: SyncEngine,
    config: Config,
    config_path: PathBuf,

    // UI state
    colors: ColorScheme,
    page: Page,

    // Dotfiles page
    tree: TreeNode,
    cursor: TreeCursor,
    list_state: ListState,

    // Add page
    input: String,
    notification: Option<Notification>,

    // Status
    status_message: String,
    logs: Vec<String>,
    tracked_count: Option<usize>,

    // Popup state
    show_help: bool,
    show_error: Option<String>,

    should_exit: bool,
}

impl App {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        // Note: Don't use tracing in TUI - raw mode conflicts with stdout
        let engine = SyncEngine::from_config(&config, &config_path);

        let mut app = Self {
            tree: scan(&engine),
            engine,
            config,
            config_path,
            colors: ColorScheme::default(),
            page: Page::Dotfiles,
            cursor: TreeCursor::default(),
            list_state: ListState::default(),
            input: String::new(),
            notification: None,
            status_message: "Ready".to_string(),
            logs: Vec::new(),
            tracked_count: None,
            show_help: false,
            show_error: None,
            should_exit: false,
        };

        app.load_tracked_count();
        app.add_log(format!("Mirroring into {}", app.engine.destination().display()));
        app
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn cursor(&self) -> TreeCursor {
        self.cursor
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn error_popup(&self) -> Option<&str> {
        self.show_error.as_deref()
    }

    /// Handle a key press
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // Any of these close an open popup; other keys are swallowed
        if self.show_help || self.show_error.is_some() {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
                self.show_error = None;
            }
            return;
        }

        if let Some(action) = key_handler::key_to_action(&key, self.page) {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: AppAction) {
        match action {
            AppAction::Quit => self.should_exit = true,
            AppAction::ShowHelp => self.show_help = true,
            AppAction::SwitchPage(page) => self.switch_page(page),
            AppAction::NextPage => self.switch_page(self.page.next()),
            AppAction::PreviousPage => self.switch_page(self.page.previous()),
            AppAction::CursorUp if self.page == Page::Dotfiles => self.cursor.up(),
            AppAction::CursorDown if self.page == Page::Dotfiles => self.cursor.down(&self.tree),
            AppAction::Toggle if self.page == Page::Dotfiles => {
                self.cursor.toggle(&mut self.tree);
            }
            AppAction::Refresh => self.refresh(),
            AppAction::Push => self.push(),
            AppAction::Submit => self.submit(),
            AppAction::InputChar(c) => self.input.push(c),
            AppAction::InputBackspace => {
                self.input.pop();
            }
            AppAction::InputClear => self.input.clear(),
            AppAction::CursorUp | AppAction::CursorDown | AppAction::Toggle => {}
        }
    }

    fn switch_page(&mut self, page: Page) {
        self.page = page;
        if page == Page::Settings {
            self.load_tracked_count();
        }
    }

    /// Re-synchronize every tracked path and rescan the destination
    fn refresh(&mut self) {
        self.add_log("Refreshing tracked dotfiles...".to_string());

        match self.engine.refresh_all() {
            Ok(summary) => {
                for (path, report) in summary.succeeded() {
                    self.add_log(format!("{}: {}", path, report));
                }
                let failures: Vec<String> = summary
                    .failed()
                    .map(|(path, e)| format!("{}: {}", path, e))
                    .collect();
                for failure in &failures {
                    self.add_log(format!("ERROR: {}", failure));
                }

                self.status_message = format!(
                    "Refreshed {} of {} in {:.2}s",
                    summary.total() - failures.len(),
                    summary.total(),
                    summary.duration.as_secs_f64()
                );
                if !failures.is_empty() {
                    self.show_error = Some(failures.join("\n"));
                }
            }
            Err(e) => {
                self.add_log(format!("ERROR: {}", e));
                self.status_message = "Refresh failed".to_string();
                self.show_error = Some(e.to_string());
            }
        }

        self.rescan();
        self.load_tracked_count();
    }

    /// Validate and mirror the path typed into the Add form
    fn submit(&mut self) {
        let path = self.input.trim().to_string();
        if path.is_empty() {
            self.notification = Some(Notification {
                message: "Enter a directory path".to_string(),
                is_error: true,
            });
            return;
        }

        match self.engine.validate_and_sync(&path) {
            Ok(report) => {
                self.add_log(format!("Added {}: {}", path, report));
                self.notification = Some(Notification {
                    message: format!("Added {} ({})", path, report),
                    is_error: false,
                });
                self.input.clear();
                self.rescan();
                self.load_tracked_count();
            }
            Err(e) => {
                self.add_log(format!("ERROR: {}", e));
                self.notification = Some(Notification {
                    message: e.to_string(),
                    is_error: true,
                });
            }
        }
    }

    fn push(&mut self) {
        if let Err(e) = self.engine.push() {
            self.add_log(format!("ERROR: {}", e));
            self.show_error = Some(e.to_string());
        }
    }

    /// Rebuild the tree from disk, keeping the root open
    fn rescan(&mut self) {
        self.tree = scan(&self.engine);
        self.cursor.clamp(&self.tree);
    }

    fn load_tracked_count(&mut self) {
        match self.engine.registry().tracked_paths() {
            Ok(paths) => self.tracked_count = Some(paths.len()),
            Err(e) => {
                self.tracked_count = None;
                self.add_log(format!("ERROR: {}", e));
            }
        }
    }

    /// Add a log message
    fn add_log(&mut self, message: String) {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.logs.push(format!("[{}] {}", timestamp, message));

        if self.logs.len() > MAX_LOG_LINES {
            self.logs.drain(..self.logs.len() - MAX_LOG_LINES);
        }
    }

    /// Draw the application UI
    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();

        let vertical_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Page tabs
                Constraint::Min(0),    // Page content
                Constraint::Length(1), // Status line
            ])
            .split(size);

        self.draw_tabs(frame, vertical_chunks[0]);

        match self.page {
            Page::Dotfiles => self.draw_dotfiles_page(frame, vertical_chunks[1]),
            Page::Add => self.draw_add_page(frame, vertical_chunks[1]),
            Page::Settings => self.draw_settings_page(frame, vertical_chunks[1]),
        }

        self.draw_status_line(frame, vertical_chunks[2]);

        if self.show_help {
            Popup::new(
                "Help (press q to close)",
                HELP_TEXT,
                self.colors.primary,
                self.colors.text,
            )
            .render(frame, size, 50, 60);
        }

        if let Some(error) = &self.show_error {
            Popup::new(
                "Error (press q to close)",
                error,
                self.colors.error,
                self.colors.text,
            )
            .render(frame, size, 60, 30);
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = Page::ALL
            .iter()
            .map(|page| format!("[{}]{}", page.index() + 1, page.title()))
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .style(Style::default().fg(self.colors.text))
            .highlight_style(
                Style::default()
                    .fg(self.colors.primary)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_dotfiles_page(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        self.list_state.select(Some(self.cursor.index()));
        TreeView::new(&self.tree, &self.colors, "Dotfiles [r]efresh").render(
            frame,
            chunks[0],
            &mut self.list_state,
        );

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(chunks[1]);

        let commands = Paragraph::new(COMMANDS_TEXT)
            .block(
                Block::default()
                    .title("Commands")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .style(Style::default().fg(self.colors.text));
        frame.render_widget(commands, right[0]);

        self.draw_log_panel(frame, right[1]);
    }

    fn draw_log_panel(&self, frame: &mut Frame, area: Rect) {
        let visible_height = area.height.saturating_sub(2) as usize;
        let start_idx = self.logs.len().saturating_sub(visible_height);

        let items: Vec<ListItem> = self.logs[start_idx..]
            .iter()
            .map(|log| {
                let color = if log.contains("ERROR") {
                    self.colors.error
                } else {
                    self.colors.text
                };
                ListItem::new(Line::from(Span::styled(
                    log.as_str(),
                    Style::default().fg(color),
                )))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("Log ({})", self.logs.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.colors.border)),
        );
        frame.render_widget(list, area);
    }

    fn draw_add_page(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Input
                Constraint::Length(3), // Result
                Constraint::Min(0),    // Hints
            ])
            .split(area);

        let input = Paragraph::new(Line::from(vec![
            Span::styled(self.input.as_str(), Style::default().fg(self.colors.text)),
            Span::styled("█", Style::default().fg(self.colors.secondary)),
        ]))
        .block(
            Block::default()
                .title("Dotfile Path")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.colors.primary)),
        );
        frame.render_widget(input, chunks[0]);

        if let Some(notification) = &self.notification {
            let color = if notification.is_error {
                self.colors.error
            } else {
                self.colors.success
            };
            let result = Paragraph::new(notification.message.as_str())
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).border_style(
                    Style::default().fg(self.colors.border),
                ));
            frame.render_widget(result, chunks[1]);
        }

        let hints = Paragraph::new(
            "Type a directory such as ~/.config/nvim and press Enter.\n\
             Esc goes back, Ctrl+U clears the field.",
        )
        .style(Style::default().fg(self.colors.border));
        frame.render_widget(hints, chunks[2]);
    }

    fn draw_settings_page(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(self.colors.secondary);
        let value = Style::default().fg(self.colors.text);
        let tracked = self
            .tracked_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unavailable".to_string());

        let rows = [
            ("Destination", self.config.destination.clone()),
            ("Settings file", self.config_path.display().to_string()),
            (
                "Registry file",
                self.engine.registry().path().display().to_string(),
            ),
            ("Tracked paths", tracked),
        ];

        let lines: Vec<Line> = rows
            .into_iter()
            .map(|(name, text)| {
                Line::from(vec![
                    Span::styled(format!("{:<15}", name), label),
                    Span::styled(text, value),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title("Settings")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.colors.border)),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_status_line(&self, frame: &mut Frame, area: Rect) {
        let text = format!(
            " {} | {} ",
            self.engine.destination().display(),
            self.status_message
        );
        let paragraph = Paragraph::new(text).style(
            Style::default()
                .fg(self.colors.secondary)
                .bg(Color::Reset),
        );
        frame.render_widget(paragraph, area);
    }
}

/// Scan the destination with its root expanded one level
fn scan(engine: &SyncEngine) -> TreeNode {
    let mut tree = build_tree(engine.destination());
    tree.expanded = true;
    tree
}

const COMMANDS_TEXT: &str = "Enter  expand/collapse
r      refresh all
Ctrl+P push
?      help
q      quit";

const HELP_TEXT: &str = r#"Keybindings:
  1/2/3    Switch page (Dotfiles, Add, Settings)
  Tab      Next page
  j/↓      Move down
  k/↑      Move up
  Enter    Expand or collapse a directory
  r        Refresh all tracked dotfiles
  Ctrl+P   Push to remote (not implemented)
  ?        Show this help
  q/Ctrl+C Quit

On the Add page, type a directory path and press Enter.
Esc returns to the Dotfiles page.
"#;
