//! Application state

use posgate_core::{KeypadButton, Principal};
use ratatui::layout::Rect;
use tokio::time::Instant;

/// Current screen/view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    /// PIN entry with keypad
    #[default]
    PinEntry,

    /// Protected panel reached after a valid PIN
    Panel { route: String },
}

/// Anonymous identity as far as the UI knows it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityStatus {
    /// No identity backend configured
    #[default]
    Disabled,
    Pending,
    Ready(Principal),
    Failed(String),
}

/// Application state
#[derive(Debug, Default)]
pub struct AppState {
    /// Current screen
    pub current_screen: Screen,

    /// Animation tick counter
    pub tick: u64,

    /// Keypad buttons as laid out in the last render
    pub keypad_hits: Vec<(Rect, KeypadButton)>,

    /// Indicator row flashes until this instant after a rejection
    pub flash_until: Option<Instant>,

    /// Ring the terminal bell on the next draw
    pub bell_pending: bool,

    /// Anonymous identity
    pub identity: IdentityStatus,

    /// Verification server, for display
    pub server_url: String,
}

impl AppState {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Whether the rejection flash is still showing
    pub fn is_flashing(&self) -> bool {
        self.flash_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Keypad button under a terminal cell, if any
    pub fn button_at(&self, column: u16, row: u16) -> Option<KeypadButton> {
        self.keypad_hits
            .iter()
            .find(|(rect, _)| {
                column >= rect.x
                    && column < rect.x.saturating_add(rect.width)
                    && row >= rect.y
                    && row < rect.y.saturating_add(rect.height)
            })
            .map(|(_, button)| *button)
    }
}
