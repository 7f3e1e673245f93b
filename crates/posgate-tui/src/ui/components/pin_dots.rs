//! Row of PIN slot indicators

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::Theme;

/// Filled slot
pub const FILLED: &str = "●";

/// Empty slot
pub const EMPTY: &str = "○";

/// Render one dot per slot, filled for entered digits. While `flashing`
/// every slot is drawn in the danger colour.
pub fn render(frame: &mut Frame, area: Rect, slots: &[bool], flashing: bool, theme: &Theme) {
    let spans: Vec<Span> = slots
        .iter()
        .enumerate()
        .flat_map(|(i, filled)| {
            let (symbol, style) = match (*filled, flashing) {
                (_, true) => (if *filled { FILLED } else { EMPTY }, theme.danger()),
                (true, false) => (FILLED, theme.pin_dot()),
                (false, false) => (EMPTY, theme.pin_placeholder()),
            };
            let gap = if i + 1 < slots.len() { "  " } else { "" };
            [Span::styled(symbol, style), Span::raw(gap)]
        })
        .collect();

    let row = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(row, area);
}
