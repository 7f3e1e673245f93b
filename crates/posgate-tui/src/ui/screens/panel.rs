//! Protected panel shown after a valid PIN

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, IdentityStatus, Screen};
use crate::ui::layout::{centered_rect_fixed, render_footer};

/// Render the panel screen
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let theme = &app.theme;
    let Screen::Panel { route } = &app.state.current_screen else {
        return;
    };

    let dialog = centered_rect_fixed(52, 12, area);
    let block = Block::default()
        .title(" Panel ")
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
            Constraint::Length(1),
            Constraint::Length(1), // Route
            Constraint::Length(1), // Server
            Constraint::Length(1), // Identity
            Constraint::Min(0),
            Constraint::Length(2), // Help
        ])
        .split(inner);

    let title = Paragraph::new("◆ LINDERO GRILL")
        .style(theme.title())
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let route = Paragraph::new(Line::from(vec![
        Span::styled("Ruta: ", theme.text_muted()),
        Span::styled(route.as_str(), theme.success()),
    ]));
    frame.render_widget(route, chunks[2]);

    let server = Paragraph::new(Line::from(vec![
        Span::styled("Servidor: ", theme.text_muted()),
        Span::styled(app.state.server_url.as_str(), theme.text()),
    ]));
    frame.render_widget(server, chunks[3]);

    let identity = match &app.state.identity {
        IdentityStatus::Disabled => Span::styled("sin configurar", theme.text_muted()),
        IdentityStatus::Pending => Span::styled("conectando…", theme.text_secondary()),
        IdentityStatus::Ready(principal) => Span::styled(principal.uid().to_string(), theme.text()),
        IdentityStatus::Failed(reason) => {
            Span::styled(format!("error: {}", reason), theme.danger())
        }
    };
    let identity = Paragraph::new(Line::from(vec![
        Span::styled("Identidad: ", theme.text_muted()),
        identity,
    ]));
    frame.render_widget(identity, chunks[4]);

    render_footer(frame, chunks[6], &[("q", "Salir")], theme);
}
