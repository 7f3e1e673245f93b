//! On-screen numeric keypad

use posgate_core::KeypadButton;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::layout::grid;
use crate::ui::Theme;

/// Keypad rows
pub const ROWS: usize = 4;

/// Keypad columns
pub const COLS: usize = 3;

/// Draw the keypad and return each button's area for hit testing.
///
/// `locked` greys out every button while a submission is in flight;
/// `submit_enabled` controls the OK button on its own.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    locked: bool,
    submit_enabled: bool,
    theme: &Theme,
) -> Vec<(Rect, KeypadButton)> {
    let cells = grid(area, ROWS, COLS);

    KeypadButton::LAYOUT
        .iter()
        .zip(cells)
        .map(|(button, cell)| {
            let enabled = match button {
                KeypadButton::Submit => submit_enabled,
                _ => !locked,
            };
            let border = if enabled && *button == KeypadButton::Submit {
                theme.border_focused()
            } else {
                theme.border()
            };

            let block = Block::default().borders(Borders::ALL).border_style(border);
            let inner = block.inner(cell);
            frame.render_widget(block, cell);

            let label = Paragraph::new(button.label())
                .style(theme.key(enabled))
                .alignment(Alignment::Center);
            frame.render_widget(label, inner);

            (cell, *button)
        })
        .collect()
}
