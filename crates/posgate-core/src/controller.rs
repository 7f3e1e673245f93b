//! PIN entry state machine
//!
//! [`PinEntryController`] owns the PIN buffer and the submission lifecycle.
//! Input arrives through plain method calls; asynchronous completions (the
//! verification response and the two overlay timers) come back as
//! [`GateEvent`]s on an internal channel, which the owner drains with
//! [`PinEntryController::step`] or [`PinEntryController::pump`].
//!
//! ```text
//! Idle --submit (complete)--> Submitting --Accepted--> navigating (terminal)
//! Submitting --Rejected | TransportError, after grace--> Idle
//! Idle --submit (incomplete)--> Idle, validation message shown
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{GateConfig, GateMessages, TimingPolicy};
use crate::pin::{PinBuffer, MAX_LEN};
use crate::timer::DelayedTask;
use crate::verify::{PinVerifier, VerificationOutcome};

/// Whether a verification is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

/// Keyboard input relevant to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter,
}

/// On-screen keypad buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadButton {
    Digit(char),
    Backspace,
    Submit,
}

impl KeypadButton {
    /// Keypad in display order, three per row
    pub const LAYOUT: [KeypadButton; 12] = [
        KeypadButton::Digit('1'),
        KeypadButton::Digit('2'),
        KeypadButton::Digit('3'),
        KeypadButton::Digit('4'),
        KeypadButton::Digit('5'),
        KeypadButton::Digit('6'),
        KeypadButton::Digit('7'),
        KeypadButton::Digit('8'),
        KeypadButton::Digit('9'),
        KeypadButton::Backspace,
        KeypadButton::Digit('0'),
        KeypadButton::Submit,
    ];

    /// Label drawn on the button
    pub fn label(&self) -> String {
        match self {
            KeypadButton::Digit(d) => d.to_string(),
            KeypadButton::Backspace => "⌫".to_string(),
            KeypadButton::Submit => "OK".to_string(),
        }
    }
}

/// What a call to [`PinEntryController::submit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    /// A verification is already in flight
    Ignored,
    /// PIN not complete; validation message shown
    Incomplete,
    /// Request issued
    Started,
}

/// Asynchronous completions delivered back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// The verification request finished
    Resolved(VerificationOutcome),
    /// Minimum loading time reached after an accepted PIN
    NavigationDue,
    /// Grace period after a failed attempt is over
    GraceElapsed,
}

/// Owns the PIN buffer, submission state and overlay timing
pub struct PinEntryController {
    buffer: PinBuffer,
    state: SubmissionState,

    /// Message region contents
    message: Option<String>,
    overlay_visible: bool,
    submit_enabled: bool,
    /// Set once navigation has fired; terminal for this controller
    navigation: Option<String>,
    /// Haptic pulse waiting to be played by the front-end
    pending_pulse: Option<Duration>,

    started_at: Option<Instant>,
    request: Option<DelayedTask>,
    timer: Option<DelayedTask>,

    verifier: Arc<dyn PinVerifier>,
    timing: TimingPolicy,
    messages: GateMessages,
    protected_route: String,

    events_tx: mpsc::UnboundedSender<GateEvent>,
    events_rx: mpsc::UnboundedReceiver<GateEvent>,
}

impl PinEntryController {
    /// Create a controller with default timing, messages and route
    pub fn new(verifier: Arc<dyn PinVerifier>) -> Self {
        Self::with_config(verifier, &GateConfig::default())
    }

    /// Create a controller from a gate configuration
    pub fn with_config(verifier: Arc<dyn PinVerifier>, config: &GateConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            buffer: PinBuffer::new(),
            state: SubmissionState::Idle,
            message: None,
            overlay_visible: false,
            submit_enabled: true,
            navigation: None,
            pending_pulse: None,
            started_at: None,
            request: None,
            timer: None,
            verifier,
            timing: config.timing(),
            messages: config.messages.clone(),
            protected_route: config.protected_route.clone(),
            events_tx,
            events_rx,
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Append a digit; ignored while submitting, for non-digits, or when full
    pub fn append_digit(&mut self, digit: char) {
        if self.is_submitting() {
            debug!("Digit ignored while submitting");
            return;
        }
        self.buffer.push(digit);
    }

    /// Remove the last digit; ignored while submitting
    pub fn remove_last_digit(&mut self) {
        if self.is_submitting() {
            debug!("Backspace ignored while submitting");
            return;
        }
        self.buffer.pop();
    }

    /// Submit the PIN for verification
    ///
    /// Must be called from within a tokio runtime when the PIN is complete.
    pub fn submit(&mut self) -> SubmitResult {
        if self.is_submitting() {
            debug!("Submit ignored: verification already in flight");
            return SubmitResult::Ignored;
        }

        if self.buffer.len() != MAX_LEN {
            self.message = Some(self.messages.incomplete_pin());
            return SubmitResult::Incomplete;
        }

        self.state = SubmissionState::Submitting;
        self.message = None;
        self.overlay_visible = true;
        self.submit_enabled = false;
        self.started_at = Some(Instant::now());
        info!("Submitting PIN for verification");

        let pin = self.buffer.secret();
        let verifier = Arc::clone(&self.verifier);
        let events = self.events_tx.clone();
        self.request = Some(DelayedTask::spawn(async move {
            let outcome = verifier.verify(&pin).await;
            let _ = events.send(GateEvent::Resolved(outcome));
        }));

        SubmitResult::Started
    }

    /// Route a keyboard key
    pub fn handle_key(&mut self, key: KeyInput) {
        match key {
            KeyInput::Char(c) if c.is_ascii_digit() => self.append_digit(c),
            KeyInput::Char(_) => {}
            KeyInput::Backspace => self.remove_last_digit(),
            KeyInput::Enter => {
                self.submit();
            }
        }
    }

    /// Route an on-screen keypad activation
    pub fn press(&mut self, button: KeypadButton) {
        match button {
            KeypadButton::Digit(d) => self.append_digit(d),
            KeypadButton::Backspace => self.remove_last_digit(),
            KeypadButton::Submit => {
                self.submit();
            }
        }
    }

    // ------------------------------------------------------------------
    // Asynchronous completions
    // ------------------------------------------------------------------

    /// Wait for the next completion, apply it, and return it
    pub async fn step(&mut self) -> GateEvent {
        // The controller holds a sender, so the channel never closes
        let event = match self.events_rx.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        };
        self.apply(event.clone());
        event
    }

    /// Apply every completion that is already waiting; returns how many
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply a single completion
    pub fn apply(&mut self, event: GateEvent) {
        match event {
            GateEvent::Resolved(outcome) => self.on_resolved(outcome),
            GateEvent::NavigationDue => {
                if self.is_submitting() && self.navigation.is_none() {
                    info!(route = %self.protected_route, "PIN accepted, navigating");
                    self.timer = None;
                    self.navigation = Some(self.protected_route.clone());
                }
            }
            GateEvent::GraceElapsed => {
                if self.is_submitting() && self.navigation.is_none() {
                    self.timer = None;
                    self.state = SubmissionState::Idle;
                    self.overlay_visible = false;
                    self.submit_enabled = true;
                    debug!("Grace period elapsed, input re-enabled");
                }
            }
        }
    }

    fn on_resolved(&mut self, outcome: VerificationOutcome) {
        if !self.is_submitting() || self.request.is_none() {
            warn!("Verification result received with no request in flight");
            return;
        }
        self.request = None;

        match outcome {
            VerificationOutcome::Accepted => {
                let elapsed = self.started_at.map(|s| s.elapsed()).unwrap_or_default();
                let delay = self.timing.min_loading.saturating_sub(elapsed);
                debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    delay_ms = delay.as_millis() as u64,
                    "PIN accepted, holding overlay"
                );
                self.schedule(delay, GateEvent::NavigationDue);
            }
            VerificationOutcome::Rejected { reason } => {
                info!("PIN rejected");
                self.buffer.clear();
                self.message = Some(reason.unwrap_or_else(|| self.messages.rejected.clone()));
                self.pending_pulse = Some(self.timing.haptic_pulse);
                self.schedule(self.timing.grace_period, GateEvent::GraceElapsed);
            }
            VerificationOutcome::TransportError => {
                // Buffer kept so the user can retry without retyping
                warn!("PIN verification failed to reach the server");
                self.message = Some(self.messages.transport.clone());
                self.schedule(self.timing.grace_period, GateEvent::GraceElapsed);
            }
        }
    }

    fn schedule(&mut self, delay: Duration, event: GateEvent) {
        self.timer = Some(DelayedTask::after(delay, self.events_tx.clone(), event));
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Number of digits entered
    pub fn pin_len(&self) -> usize {
        self.buffer.len()
    }

    /// Indicator row: slot `i` filled iff `i < pin_len()`
    pub fn indicator(&self) -> [bool; MAX_LEN] {
        self.buffer.indicator()
    }

    /// Current message region text
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Route to navigate to, once the accepted PIN's loading time is over
    pub fn navigation(&self) -> Option<&str> {
        self.navigation.as_deref()
    }

    /// Take the pending haptic pulse, if any
    pub fn take_haptic_pulse(&mut self) -> Option<Duration> {
        self.pending_pulse.take()
    }
}

impl std::fmt::Debug for PinEntryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinEntryController")
            .field("buffer", &self.buffer)
            .field("state", &self.state)
            .field("message", &self.message)
            .field("overlay_visible", &self.overlay_visible)
            .field("submit_enabled", &self.submit_enabled)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Verifier that answers with a fixed outcome after a fixed delay
    struct ScriptedVerifier {
        outcome: VerificationOutcome,
        latency: Duration,
        calls: AtomicUsize,
        last_pin: Mutex<Option<String>>,
    }

    impl ScriptedVerifier {
        fn new(outcome: VerificationOutcome, latency_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                latency: Duration::from_millis(latency_ms),
                calls: AtomicUsize::new(0),
                last_pin: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PinVerifier for ScriptedVerifier {
        async fn verify(&self, pin: &str) -> VerificationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_pin.lock().unwrap() = Some(pin.to_string());
            tokio::time::sleep(self.latency).await;
            self.outcome.clone()
        }
    }

    fn type_pin(controller: &mut PinEntryController, pin: &str) {
        for c in pin.chars() {
            controller.handle_key(KeyInput::Char(c));
        }
    }

    /// Paused-clock timings land on the millisecond tick, allow for rounding
    fn assert_near(actual: Duration, expected: Duration) {
        let slack = Duration::from_millis(5);
        assert!(
            actual >= expected && actual <= expected + slack,
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    fn rejected(reason: Option<&str>) -> VerificationOutcome {
        VerificationOutcome::Rejected {
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_initial_state() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let controller = PinEntryController::new(verifier);
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(controller.indicator(), [false; MAX_LEN]);
        assert!(controller.submit_enabled());
        assert!(!controller.overlay_visible());
        assert!(controller.message().is_none());
    }

    #[test]
    fn test_keyboard_routing() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let mut controller = PinEntryController::new(verifier);

        type_pin(&mut controller, "1a2");
        assert_eq!(controller.pin_len(), 2);
        controller.handle_key(KeyInput::Backspace);
        assert_eq!(controller.pin_len(), 1);
        assert_eq!(controller.indicator(), [true, false, false, false]);
    }

    #[test]
    fn test_keypad_routing() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let mut controller = PinEntryController::new(verifier);

        controller.press(KeypadButton::Digit('5'));
        controller.press(KeypadButton::Digit('6'));
        controller.press(KeypadButton::Backspace);
        assert_eq!(controller.pin_len(), 1);
    }

    #[test]
    fn test_fifth_digit_ignored() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "12345");
        assert_eq!(controller.pin_len(), MAX_LEN);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_submit_does_not_call_server() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let mut controller = PinEntryController::new(verifier.clone());

        type_pin(&mut controller, "123");
        assert_eq!(controller.submit(), SubmitResult::Incomplete);
        assert_eq!(controller.message(), Some("Completa los 4 dígitos."));
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!controller.overlay_visible());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.pump(), 0);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_locks_controller() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 500);
        let mut controller = PinEntryController::new(verifier.clone());

        type_pin(&mut controller, "0102");
        assert_eq!(controller.submit(), SubmitResult::Started);
        assert!(controller.overlay_visible());
        assert!(!controller.submit_enabled());

        // Second trigger, digits and backspace are all no-ops
        assert_eq!(controller.submit(), SubmitResult::Ignored);
        controller.handle_key(KeyInput::Enter);
        controller.handle_key(KeyInput::Backspace);
        controller.press(KeypadButton::Digit('9'));
        assert_eq!(controller.pin_len(), 4);

        controller.step().await;
        assert_eq!(verifier.calls(), 1);
        assert_eq!(verifier.last_pin.lock().unwrap().as_deref(), Some("0102"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_accept_holds_overlay_for_minimum() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 500);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "0102");

        let start = Instant::now();
        controller.submit();

        let event = controller.step().await;
        assert_eq!(event, GateEvent::Resolved(VerificationOutcome::Accepted));
        let resolved_at = start.elapsed();
        assert_near(resolved_at, Duration::from_millis(500));
        assert!(controller.navigation().is_none());

        assert_eq!(controller.step().await, GateEvent::NavigationDue);
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert_near(start.elapsed() - resolved_at, Duration::from_millis(1500));
        assert_eq!(controller.navigation(), Some("/panel"));

        // Still locked with the overlay up while navigating
        assert_eq!(controller.state(), SubmissionState::Submitting);
        assert!(controller.overlay_visible());
        assert_eq!(controller.pin_len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_accept_navigates_immediately() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 3000);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "0102");

        let start = Instant::now();
        controller.submit();
        controller.step().await;
        let resolved_at = start.elapsed();
        assert_near(resolved_at, Duration::from_millis(3000));

        assert_eq!(controller.step().await, GateEvent::NavigationDue);
        assert_near(start.elapsed(), resolved_at);
        assert_eq!(controller.navigation(), Some("/panel"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_with_reason() {
        let verifier = ScriptedVerifier::new(rejected(Some("bloqueado")), 300);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "1111");
        controller.submit();

        controller.step().await;
        assert_eq!(controller.pin_len(), 0);
        assert_eq!(controller.indicator(), [false; MAX_LEN]);
        assert_eq!(controller.message(), Some("bloqueado"));
        assert_eq!(
            controller.take_haptic_pulse(),
            Some(Duration::from_millis(120))
        );
        assert_eq!(controller.take_haptic_pulse(), None);

        // Overlay still up during the grace period
        assert!(controller.overlay_visible());
        assert!(controller.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_without_reason_uses_default() {
        let verifier = ScriptedVerifier::new(rejected(None), 0);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "1111");
        controller.submit();

        controller.step().await;
        assert_eq!(controller.message(), Some("PIN incorrecto"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_keeps_buffer() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::TransportError, 100);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "4321");
        controller.submit();

        controller.step().await;
        assert_eq!(controller.pin_len(), 4);
        assert_eq!(controller.indicator(), [true; 4]);
        assert_eq!(controller.message(), Some("Error de conexión"));
        assert_eq!(controller.take_haptic_pulse(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_period_then_idle() {
        let verifier = ScriptedVerifier::new(rejected(None), 250);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "1111");

        let start = Instant::now();
        controller.submit();
        controller.step().await;
        let resolved_at = start.elapsed();

        assert_eq!(controller.step().await, GateEvent::GraceElapsed);
        assert_near(start.elapsed() - resolved_at, Duration::from_millis(2000));
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!controller.overlay_visible());
        assert!(controller.submit_enabled());
        assert!(controller.navigation().is_none());

        // Usable again
        type_pin(&mut controller, "22");
        assert_eq!(controller.pin_len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_transport_error() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::TransportError, 0);
        let mut controller = PinEntryController::new(verifier.clone());
        type_pin(&mut controller, "4321");
        controller.submit();
        controller.step().await;
        controller.step().await;

        assert_eq!(controller.submit(), SubmitResult::Started);
        assert!(controller.message().is_none());
        controller.step().await;
        assert_eq!(verifier.calls(), 2);
        assert_eq!(verifier.last_pin.lock().unwrap().as_deref(), Some("4321"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_applies_ready_events() {
        let verifier = ScriptedVerifier::new(rejected(None), 100);
        let mut controller = PinEntryController::new(verifier);
        type_pin(&mut controller, "1111");
        controller.submit();

        assert_eq!(controller.pump(), 0);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(controller.pump(), 1);
        assert_eq!(controller.message(), Some("PIN incorrecto"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_route_and_timing() {
        let config = GateConfig {
            protected_route: "/caja".to_string(),
            min_loading_ms: 800,
            ..GateConfig::default()
        };
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 100);
        let mut controller = PinEntryController::with_config(verifier, &config);
        type_pin(&mut controller, "0102");

        let start = Instant::now();
        controller.submit();
        controller.step().await;
        controller.step().await;
        assert_near(start.elapsed(), Duration::from_millis(800));
        assert_eq!(controller.navigation(), Some("/caja"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_events_ignored() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 0);
        let mut controller = PinEntryController::new(verifier);

        controller.apply(GateEvent::Resolved(VerificationOutcome::Accepted));
        controller.apply(GateEvent::NavigationDue);
        controller.apply(GateEvent::GraceElapsed);
        assert!(controller.navigation().is_none());
        assert_eq!(controller.state(), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_in_flight_request() {
        let verifier = ScriptedVerifier::new(VerificationOutcome::Accepted, 1000);
        let mut controller = PinEntryController::new(verifier.clone());
        type_pin(&mut controller, "0102");
        controller.submit();
        tokio::task::yield_now().await;
        assert_eq!(verifier.calls(), 1);
        assert_eq!(Arc::strong_count(&verifier), 3);

        drop(controller);
        for _ in 0..10 {
            if Arc::strong_count(&verifier) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        // The aborted request released its clone of the verifier
        assert_eq!(Arc::strong_count(&verifier), 1);
    }
}
