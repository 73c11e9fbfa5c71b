//! Key handling for the TUI application
//!
//! Key events are translated into [`AppAction`]s depending on the page in
//! focus; the Add page captures plain characters as text input, so page
//! switching there goes through Tab or Esc only.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Pages of the application, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dotfiles,
    Add,
    Settings,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Dotfiles, Page::Add, Page::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Page::Dotfiles => "Dotfiles",
            Page::Add => "Add Dotfile",
            Page::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Page::Dotfiles => 0,
            Page::Add => 1,
            Page::Settings => 2,
        }
    }

    pub fn next(self) -> Page {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Page {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// High-level application actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    ShowHelp,
    SwitchPage(Page),
    NextPage,
    PreviousPage,
    CursorUp,
    CursorDown,
    Toggle,
    Refresh,
    Push,
    Submit,
    InputChar(char),
    InputBackspace,
    InputClear,
}

/// Helper functions for key event processing
pub mod key_handler {
    use super::*;

    /// Check if a key event matches a specific key combination
    pub fn matches_key(event: &KeyEvent, code: KeyCode, modifiers: KeyModifiers) -> bool {
        event.code == code && event.modifiers == modifiers
    }

    /// Check if a key event is Ctrl+key combination
    pub fn matches_ctrl_key(event: &KeyEvent, code: KeyCode) -> bool {
        matches_key(event, code, KeyModifiers::CONTROL)
    }

    /// Convert a key event to an action for the given page
    pub fn key_to_action(event: &KeyEvent, page: Page) -> Option<AppAction> {
        if matches_ctrl_key(event, KeyCode::Char('c')) {
            return Some(AppAction::Quit);
        }
        if matches_ctrl_key(event, KeyCode::Char('p')) {
            return Some(AppAction::Push);
        }

        match event.code {
            KeyCode::Tab => return Some(AppAction::NextPage),
            KeyCode::BackTab => return Some(AppAction::PreviousPage),
            _ => {}
        }

        if page == Page::Add {
            return input_action(event);
        }

        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppAction::Quit),
            KeyCode::Char('?') | KeyCode::F(1) => Some(AppAction::ShowHelp),
            KeyCode::Char('1') => Some(AppAction::SwitchPage(Page::Dotfiles)),
            KeyCode::Char('2') => Some(AppAction::SwitchPage(Page::Add)),
            KeyCode::Char('3') => Some(AppAction::SwitchPage(Page::Settings)),
            KeyCode::Up | KeyCode::Char('k') => Some(AppAction::CursorUp),
            KeyCode::Down | KeyCode::Char('j') => Some(AppAction::CursorDown),
            KeyCode::Enter | KeyCode::Char(' ') => Some(AppAction::Toggle),
            KeyCode::Char('r') => Some(AppAction::Refresh),
            _ => None,
        }
    }

    fn input_action(event: &KeyEvent) -> Option<AppAction> {
        if matches_ctrl_key(event, KeyCode::Char('u')) {
            return Some(AppAction::InputClear);
        }

        match event.code {
            KeyCode::Enter => Some(AppAction::Submit),
            KeyCode::Backspace => Some(AppAction::InputBackspace),
            KeyCode::Esc => Some(AppAction::SwitchPage(Page::Dotfiles)),
            KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppAction::InputChar(c))
            }
            _ => None,
        }
    }
}
