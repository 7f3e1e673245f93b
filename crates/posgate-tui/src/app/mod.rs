//! Application state and event handling

mod config;
mod events;
mod state;

pub use config::{ConfigError, TuiConfig};
pub use events::{Event, EventHandler};
pub use state::{AppState, IdentityStatus, Screen};

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use posgate_core::{
    FirebaseAuth, FirebaseConfig, GateEvent, IdentityBootstrap, KeyInput, PinEntryController,
    PinVerifier,
};
use ratatui::prelude::*;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ui::{self, Theme};

/// Tick rate for animations
const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application struct
pub struct App {
    /// Application state
    pub state: AppState,

    /// PIN gate; dropped once the PIN is accepted
    pub gate: Option<PinEntryController>,

    /// Visual theme
    pub theme: Theme,

    /// Whether the app should quit
    pub should_quit: bool,

    events: EventHandler,
    firebase: Option<FirebaseConfig>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: &TuiConfig, verifier: Arc<dyn PinVerifier>) -> Self {
        let theme = if config.high_contrast {
            Theme::high_contrast()
        } else {
            Theme::default()
        };

        let mut state = AppState::new(config.gate.server_url.clone());
        if config.firebase.is_some() {
            state.identity = IdentityStatus::Pending;
        }

        Self {
            state,
            gate: Some(PinEntryController::with_config(verifier, &config.gate)),
            theme,
            should_quit: false,
            events: EventHandler::new(TICK_RATE),
            firebase: config.firebase.clone(),
        }
    }

    /// Run the application main loop
    pub async fn run<B: Backend + Write>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        self.events.start();
        self.spawn_identity_bootstrap();

        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, self))?;

            if std::mem::take(&mut self.state.bell_pending) {
                terminal.backend_mut().write_all(b"\x07")?;
                std::io::Write::flush(terminal.backend_mut())?;
            }

            let gate = &mut self.gate;
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                event = next_gate_event(gate) => self.on_gate_event(event),
            }
        }

        Ok(())
    }

    /// Resolve the anonymous identity in the background
    fn spawn_identity_bootstrap(&self) {
        let Some(firebase) = self.firebase.clone() else {
            debug!("No identity backend configured");
            return;
        };

        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = match FirebaseAuth::initialize(firebase) {
                Ok(auth) => {
                    IdentityBootstrap::new(Arc::new(auth))
                        .ensure_anonymous_identity()
                        .await
                }
                Err(e) => Err(e),
            };
            let event = match result {
                Ok(principal) => Event::IdentityReady(principal),
                Err(e) => Event::IdentityFailed(e.to_string()),
            };
            let _ = sender.send(event);
        });
    }

    /// Apply one application event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Key(_) => {}
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize => {}
            Event::Tick => {
                self.state.tick = self.state.tick.wrapping_add(1);
                if !self.state.is_flashing() {
                    self.state.flash_until = None;
                }
            }
            Event::IdentityReady(principal) => {
                info!(uid = %principal.uid(), "Anonymous identity ready");
                self.state.identity = IdentityStatus::Ready(principal);
            }
            Event::IdentityFailed(reason) => {
                warn!("Anonymous sign-in failed: {}", reason);
                self.state.identity = IdentityStatus::Failed(reason);
            }
        }
    }

    /// Handle key press events
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Global quit handler
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return;
        }

        match self.state.current_screen {
            Screen::PinEntry => self.handle_pin_entry_key(key.code),
            Screen::Panel { .. } => self.handle_panel_key(key.code),
        }
    }

    fn handle_pin_entry_key(&mut self, key: KeyCode) {
        let input = match key {
            KeyCode::Char(c) => KeyInput::Char(c),
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Enter => KeyInput::Enter,
            _ => return,
        };
        if let Some(gate) = self.gate.as_mut() {
            gate.handle_key(input);
        }
        self.sync_gate();
    }

    fn handle_panel_key(&mut self, key: KeyCode) {
        if key == KeyCode::Char('q') {
            self.should_quit = true;
        }
    }

    /// Route left clicks on keypad buttons to the gate
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if self.state.current_screen != Screen::PinEntry {
            return;
        }
        let Some(button) = self.state.button_at(mouse.column, mouse.row) else {
            return;
        };
        if let Some(gate) = self.gate.as_mut() {
            debug!(?button, "Keypad click");
            gate.press(button);
        }
        self.sync_gate();
    }

    /// React to a gate event that was already applied by the controller
    pub fn on_gate_event(&mut self, event: GateEvent) {
        debug!(?event, "Gate event");
        self.sync_gate();
    }

    /// Pick up haptic pulses and navigation requested by the gate
    fn sync_gate(&mut self) {
        let Some(gate) = self.gate.as_mut() else {
            return;
        };

        if let Some(pulse) = gate.take_haptic_pulse() {
            self.state.flash_until = Some(Instant::now() + pulse);
            self.state.bell_pending = true;
        }

        if let Some(route) = gate.navigation().map(str::to_owned) {
            info!(route = %route, "PIN accepted, opening protected panel");
            // Dropping the controller cancels its timers
            self.gate = None;
            self.state.keypad_hits.clear();
            self.state.flash_until = None;
            self.state.current_screen = Screen::Panel { route };
        }
    }
}

/// Next event from the gate, or never if the gate is gone
pub async fn next_gate_event(gate: &mut Option<PinEntryController>) -> GateEvent {
    match gate {
        Some(gate) => gate.step().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use posgate_core::{Principal, VerificationOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedVerifier {
        outcome: VerificationOutcome,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PinVerifier for FixedVerifier {
        async fn verify(&self, _pin: &str) -> VerificationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.outcome.clone()
        }
    }

    fn app_with(outcome: VerificationOutcome) -> (App, Arc<FixedVerifier>) {
        let verifier = Arc::new(FixedVerifier {
            outcome,
            calls: AtomicUsize::new(0),
        });
        let app = App::new(&TuiConfig::default(), verifier.clone());
        (app, verifier)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_pin(app: &mut App, pin: &str) {
        for c in pin.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    async fn drive(app: &mut App) -> GateEvent {
        let event = next_gate_event(&mut app.gate).await;
        app.on_gate_event(event.clone());
        event
    }

    #[test]
    fn test_initial_state() {
        let (app, _) = app_with(VerificationOutcome::Accepted);
        assert_eq!(app.state.current_screen, Screen::PinEntry);
        assert_eq!(app.state.identity, IdentityStatus::Disabled);
        assert!(app.gate.is_some());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = app_with(VerificationOutcome::Accepted);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);

        let (mut app, _) = app_with(VerificationOutcome::Accepted);
        app.handle_event(key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_typing_fills_gate() {
        let (mut app, _) = app_with(VerificationOutcome::Accepted);
        type_pin(&mut app, "12x");
        assert_eq!(app.gate.as_ref().unwrap().pin_len(), 2);

        app.handle_event(key(KeyCode::Backspace));
        assert_eq!(app.gate.as_ref().unwrap().pin_len(), 1);
    }

    #[test]
    fn test_key_release_ignored() {
        let (mut app, _) = app_with(VerificationOutcome::Accepted);
        let mut release = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        app.handle_event(Event::Key(release));
        assert_eq!(app.gate.as_ref().unwrap().pin_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_pin_opens_panel() {
        let (mut app, verifier) = app_with(VerificationOutcome::Accepted);
        type_pin(&mut app, "0102");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.gate.as_ref().unwrap().overlay_visible());

        assert!(matches!(drive(&mut app).await, GateEvent::Resolved(_)));
        assert_eq!(app.state.current_screen, Screen::PinEntry);

        assert_eq!(drive(&mut app).await, GateEvent::NavigationDue);
        assert!(app.gate.is_none());
        assert_eq!(
            app.state.current_screen,
            Screen::Panel {
                route: "/panel".to_string()
            }
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);

        // Panel ignores digits and quits on q
        app.handle_event(key(KeyCode::Char('1')));
        assert!(!app.should_quit);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_flashes_and_rings() {
        let (mut app, _) = app_with(VerificationOutcome::Rejected { reason: None });
        type_pin(&mut app, "9999");
        app.handle_event(key(KeyCode::Enter));

        drive(&mut app).await;
        assert!(app.state.bell_pending);
        assert!(app.state.is_flashing());
        let gate = app.gate.as_ref().unwrap();
        assert_eq!(gate.pin_len(), 0);
        assert_eq!(gate.message(), Some("PIN incorrecto"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        app.handle_event(Event::Tick);
        assert!(!app.state.is_flashing());
        assert!(app.state.flash_until.is_none());

        assert_eq!(drive(&mut app).await, GateEvent::GraceElapsed);
        assert!(!app.gate.as_ref().unwrap().overlay_visible());
        assert_eq!(app.state.current_screen, Screen::PinEntry);
    }

    #[test]
    fn test_identity_events() {
        let mut config = TuiConfig::default();
        config.firebase = Some(FirebaseConfig {
            api_key: "k".to_string(),
            auth_domain: String::new(),
            project_id: "p".to_string(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            identity_endpoint: posgate_core::DEFAULT_IDENTITY_ENDPOINT.to_string(),
        });
        let mut app = App::new(
            &config,
            Arc::new(FixedVerifier {
                outcome: VerificationOutcome::Accepted,
                calls: AtomicUsize::new(0),
            }),
        );
        assert_eq!(app.state.identity, IdentityStatus::Pending);

        app.handle_event(Event::IdentityFailed("offline".to_string()));
        assert_eq!(
            app.state.identity,
            IdentityStatus::Failed("offline".to_string())
        );

        let principal = Principal::anonymous("anon-1", None);
        app.handle_event(Event::IdentityReady(principal.clone()));
        assert_eq!(app.state.identity, IdentityStatus::Ready(principal));
    }
}
