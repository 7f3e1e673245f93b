//! Spinner for the loading overlay

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::Theme;

/// Spinner animation for indeterminate progress
pub struct Spinner {
    /// Current frame
    frame: usize,
    /// Spinner characters
    chars: Vec<char>,
    /// Label text
    label: String,
}

impl Spinner {
    /// Create a new spinner
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            frame: 0,
            chars: vec!['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'],
            label: label.into(),
        }
    }

    /// Set frame based on tick counter
    pub fn set_tick(&mut self, tick: u64) {
        self.frame = (tick as usize) % self.chars.len();
    }

    /// Render the spinner
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let spinner_char = self.chars[self.frame];
        let text = format!("{} {}", spinner_char, self.label);

        let paragraph = Paragraph::new(text)
            .style(theme.text_highlight())
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}
