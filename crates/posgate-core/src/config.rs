//! Gate configuration: server location, timing and user-facing messages

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pin::MAX_LEN;
use crate::{PROTECTED_ROUTE, VERIFY_PATH};

/// Minimum time the loading overlay stays up before navigating (ms)
pub const MIN_LOADING_MS: u64 = 2000;

/// Time the overlay stays up after a failed attempt resolves (ms)
pub const GRACE_PERIOD_MS: u64 = 2000;

/// Length of the haptic pulse on a rejected PIN (ms)
pub const HAPTIC_PULSE_MS: u64 = 120;

/// Settings shared by every front-end of the gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    /// Base URL of the verification server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path of the verification endpoint
    #[serde(default = "default_verify_path")]
    pub verify_path: String,

    /// Route to navigate to once the PIN is accepted
    #[serde(default = "default_protected_route")]
    pub protected_route: String,

    #[serde(default = "default_min_loading_ms")]
    pub min_loading_ms: u64,

    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    #[serde(default = "default_haptic_pulse_ms")]
    pub haptic_pulse_ms: u64,

    #[serde(default)]
    pub messages: GateMessages,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_verify_path() -> String {
    VERIFY_PATH.to_string()
}

fn default_protected_route() -> String {
    PROTECTED_ROUTE.to_string()
}

fn default_min_loading_ms() -> u64 {
    MIN_LOADING_MS
}

fn default_grace_period_ms() -> u64 {
    GRACE_PERIOD_MS
}

fn default_haptic_pulse_ms() -> u64 {
    HAPTIC_PULSE_MS
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            verify_path: default_verify_path(),
            protected_route: default_protected_route(),
            min_loading_ms: MIN_LOADING_MS,
            grace_period_ms: GRACE_PERIOD_MS,
            haptic_pulse_ms: HAPTIC_PULSE_MS,
            messages: GateMessages::default(),
        }
    }
}

impl GateConfig {
    /// Timing policy derived from the millisecond settings
    pub fn timing(&self) -> TimingPolicy {
        TimingPolicy {
            min_loading: Duration::from_millis(self.min_loading_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
            haptic_pulse: Duration::from_millis(self.haptic_pulse_ms),
        }
    }
}

/// Overlay and feedback timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    /// Minimum overlay time, measured from submission start, before navigating
    pub min_loading: Duration,
    /// Overlay time after a rejected or failed attempt resolves
    pub grace_period: Duration,
    /// Haptic pulse length on rejection
    pub haptic_pulse: Duration,
}

/// User-facing messages, in the display locale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateMessages {
    /// Shown when submitting an incomplete PIN; `{n}` is replaced by the PIN length
    #[serde(default = "default_incomplete")]
    pub incomplete: String,

    /// Shown when the server rejects the PIN without giving a reason
    #[serde(default = "default_rejected")]
    pub rejected: String,

    /// Shown when the server could not be reached
    #[serde(default = "default_transport")]
    pub transport: String,
}

fn default_incomplete() -> String {
    "Completa los {n} dígitos.".to_string()
}

fn default_rejected() -> String {
    "PIN incorrecto".to_string()
}

fn default_transport() -> String {
    "Error de conexión".to_string()
}

impl Default for GateMessages {
    fn default() -> Self {
        Self {
            incomplete: default_incomplete(),
            rejected: default_rejected(),
            transport: default_transport(),
        }
    }
}

impl GateMessages {
    /// Validation message with the PIN length filled in
    pub fn incomplete_pin(&self) -> String {
        self.incomplete.replace("{n}", &MAX_LEN.to_string())
    }
}
