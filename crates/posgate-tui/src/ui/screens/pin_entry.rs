//! PIN entry screen

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::App;
use crate::ui::components::{keypad, pin_dots, spinner::Spinner};
use crate::ui::layout::{centered_rect_fixed, render_footer};

/// Dialog size
const DIALOG_WIDTH: u16 = 36;
const DIALOG_HEIGHT: u16 = 24;

/// Label under the overlay spinner
pub const VERIFYING_LABEL: &str = "Verificando…";

/// Render the PIN entry screen
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let theme = &app.theme;
    let Some(gate) = app.gate.as_ref() else {
        return;
    };

    let dialog = centered_rect_fixed(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    let block = Block::default()
        .title(" Acceso ")
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());

    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Instructions
            Constraint::Length(1),
            Constraint::Length(1), // Indicator
            Constraint::Length(1), // Message
            Constraint::Length(1),
            Constraint::Min(12),   // Keypad
            Constraint::Length(2), // Help
        ])
        .split(inner);

    let title = Paragraph::new("◆ LINDERO GRILL")
        .style(theme.title())
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let instructions = Paragraph::new("Ingresa tu PIN")
        .style(theme.text_secondary())
        .alignment(Alignment::Center);
    frame.render_widget(instructions, chunks[1]);

    pin_dots::render(
        frame,
        chunks[3],
        &gate.indicator(),
        app.state.is_flashing(),
        theme,
    );

    if let Some(message) = gate.message() {
        let message = Paragraph::new(message)
            .style(theme.danger())
            .alignment(Alignment::Center);
        frame.render_widget(message, chunks[4]);
    }

    let hits = keypad::render(
        frame,
        chunks[6],
        gate.is_submitting(),
        gate.submit_enabled(),
        theme,
    );

    render_footer(
        frame,
        chunks[7],
        &[("0-9", "Dígito"), ("⌫", "Borrar"), ("Enter", "Entrar"), ("Esc", "Salir")],
        theme,
    );

    if gate.overlay_visible() {
        // The overlay swallows clicks
        app.state.keypad_hits.clear();

        frame.render_widget(Clear, area);
        frame.render_widget(Block::default().style(theme.overlay()), area);

        let mut spinner = Spinner::new(VERIFYING_LABEL);
        spinner.set_tick(app.state.tick);
        spinner.render(frame, centered_rect_fixed(area.width, 1, area), theme);
    } else {
        app.state.keypad_hits = hits;
    }
}
