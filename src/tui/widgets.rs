//! Reusable widgets for the TUI application

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tree::{visible_entries, TreeNode};

/// Color scheme for the TUI
pub struct ColorScheme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub error: Color,
    pub directory: Color,
    pub text: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Cyan,
            success: Color::Green,
            error: Color::Red,
            directory: Color::Green,
            text: Color::White,
            border: Color::Gray,
        }
    }
}

/// Indented view of a tree's visible nodes with a highlighted row
pub struct TreeView<'a> {
    root: &'a TreeNode,
    colors: &'a ColorScheme,
    title: String,
}

impl<'a> TreeView<'a> {
    pub fn new(root: &'a TreeNode, colors: &'a ColorScheme, title: impl Into<String>) -> Self {
        Self {
            root,
            colors,
            title: title.into(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &mut ListState) {
        let items: Vec<ListItem> = visible_entries(self.root)
            .into_iter()
            .map(|(depth, node)| {
                let marker = match (node.has_children(), node.expanded) {
                    (true, true) => "▾ ",
                    (true, false) => "▸ ",
                    (false, _) => "  ",
                };
                let color = if node.is_dir() {
                    self.colors.directory
                } else {
                    self.colors.text
                };

                ListItem::new(Line::from(vec![
                    Span::raw("  ".repeat(depth)),
                    Span::styled(marker, Style::default().fg(self.colors.secondary)),
                    Span::styled(node.label.as_str(), Style::default().fg(color)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(self.title.as_str())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.colors.border)),
            )
            .highlight_style(
                Style::default()
                    .bg(self.colors.primary)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, state);
    }
}

/// Modal message box drawn over the page
pub struct Popup<'a> {
    title: &'a str,
    body: &'a str,
    border: Color,
    text: Color,
}

impl<'a> Popup<'a> {
    pub fn new(title: &'a str, body: &'a str, border: Color, text: Color) -> Self {
        Self {
            title,
            body,
            border,
            text,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, percent_x: u16, percent_y: u16) {
        let popup_area = centered_rect(percent_x, percent_y, area);
        frame.render_widget(Clear, popup_area);

        let paragraph = Paragraph::new(self.body)
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.border)),
            )
            .style(Style::default().fg(self.text))
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}

/// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
