//! Visual theme and color palette

use ratatui::style::{Color, Modifier, Style};

/// Gate color palette
pub struct Theme {
    // Primary branding colors
    pub brand: Color,
    pub brand_dark: Color,

    // Status colors
    pub success: Color,
    pub danger: Color,

    // UI element colors
    pub border: Color,
    pub border_focused: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub key_face: Color,
    pub overlay: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Primary branding - ember orange
            brand: Color::Rgb(255, 112, 67),    // #FF7043
            brand_dark: Color::Rgb(38, 30, 28), // #261E1C

            // Status colors
            success: Color::Rgb(76, 175, 80), // #4CAF50 - Green
            danger: Color::Rgb(244, 67, 54),  // #F44336 - Red

            // UI elements
            border: Color::Rgb(66, 66, 66),            // #424242
            border_focused: Color::Rgb(255, 112, 67),  // #FF7043
            text_primary: Color::Rgb(250, 250, 250),   // #FAFAFA
            text_secondary: Color::Rgb(189, 189, 189), // #BDBDBD
            text_muted: Color::Rgb(117, 117, 117),     // #757575
            key_face: Color::Rgb(55, 55, 55),          // #373737
            overlay: Color::Rgb(18, 18, 18),           // #121212
        }
    }
}

impl Theme {
    /// Get default text style
    pub fn text(&self) -> Style {
        Style::default().fg(self.text_primary)
    }

    /// Get secondary text style
    pub fn text_secondary(&self) -> Style {
        Style::default().fg(self.text_secondary)
    }

    /// Get muted text style
    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    /// Get highlighted text style
    pub fn text_highlight(&self) -> Style {
        Style::default()
            .fg(self.brand)
            .add_modifier(Modifier::BOLD)
    }

    /// Get title style
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.brand)
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get focused border style
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Get success style
    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Get danger style
    pub fn danger(&self) -> Style {
        Style::default()
            .fg(self.danger)
            .add_modifier(Modifier::BOLD)
    }

    /// Get PIN dot style
    pub fn pin_dot(&self) -> Style {
        Style::default()
            .fg(self.brand)
            .add_modifier(Modifier::BOLD)
    }

    /// Get PIN placeholder style
    pub fn pin_placeholder(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    /// Keypad button face
    pub fn key(&self, enabled: bool) -> Style {
        if enabled {
            Style::default()
                .fg(self.text_primary)
                .bg(self.key_face)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text_muted).bg(self.brand_dark)
        }
    }

    /// Loading overlay background
    pub fn overlay(&self) -> Style {
        Style::default().bg(self.overlay)
    }

    /// Create a high-contrast theme variant
    pub fn high_contrast() -> Self {
        Self {
            text_primary: Color::White,
            text_secondary: Color::White,
            text_muted: Color::Gray,
            border: Color::White,
            border_focused: Color::Yellow,
            key_face: Color::Black,
            ..Self::default()
        }
    }
}
