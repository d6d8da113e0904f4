//! Worker-side view state, driven by protocol messages and key presses.

use std::collections::HashMap;

use crate::worker::protocol::{Message, MENU_QUIT, MENU_SEPARATOR};

/// What activating a menu entry asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Selected(String),
}

#[derive(Debug, Default)]
pub struct TuiState {
    menu: Vec<String>,
    counts: HashMap<String, usize>,
    selected: usize,
    configured: bool,
    last_dir: Option<String>,
}

impl TuiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, message: Message) {
        match message {
            Message::Config { config_array } => {
                self.menu = config_array;
                self.configured = true;
                self.selected = 0;
                self.skip_separator(true);
            }
            Message::DataFromParent { count, dir } => {
                // Directories attached after the config arrive without a menu entry
                if !self.menu.contains(&dir) {
                    let at = self
                        .menu
                        .iter()
                        .position(|e| e == MENU_SEPARATOR)
                        .unwrap_or(self.menu.len());
                    self.menu.insert(at, dir.clone());
                    if self.selected >= at && self.configured {
                        self.selected += 1;
                    }
                }
                self.counts.insert(dir.clone(), count);
                self.last_dir = Some(dir);
            }
            Message::ChildReady | Message::Log { .. } => {}
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn menu(&self) -> &[String] {
        &self.menu
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn count_for(&self, dir: &str) -> Option<usize> {
        self.counts.get(dir).copied()
    }

    /// Sum of the latest count of every directory.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn last_dir(&self) -> Option<&str> {
        self.last_dir.as_deref()
    }

    fn skip_separator(&mut self, forward: bool) {
        if self.menu.get(self.selected).is_some_and(|e| e == MENU_SEPARATOR) {
            if forward {
                self.selected = (self.selected + 1).min(self.menu.len().saturating_sub(1));
            } else {
                self.selected = self.selected.saturating_sub(1);
            }
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.menu.len() {
            self.selected += 1;
            self.skip_separator(true);
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.skip_separator(false);
        }
    }

    pub fn activate(&self) -> Option<Action> {
        match self.menu.get(self.selected)?.as_str() {
            MENU_SEPARATOR => None,
            MENU_QUIT => Some(Action::Quit),
            dir => Some(Action::Selected(dir.to_string())),
        }
    }
}
