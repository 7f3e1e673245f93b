//! UI rendering

pub mod components;
pub mod layout;
pub mod screens;
pub mod theme;

pub use theme::Theme;

use ratatui::prelude::*;

use crate::app::{App, Screen};

/// Main render function - delegates to appropriate screen
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.state.current_screen {
        Screen::PinEntry => screens::pin_entry::render(frame, app),
        Screen::Panel { .. } => screens::panel::render(frame, app),
    }
}
