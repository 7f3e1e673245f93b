//! posgate-server: reference implementation of the PIN verification endpoint
//!
//! `POST /verify-pin` checks a submitted PIN against one configured PIN and
//! answers with the `{"ok": ..., "error": ...}` body the gate expects.
//! The server holds no sessions.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use posgate_core::{VerifyPinResponse, VERIFY_PATH};
use serde_json::Value;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Default PIN when none is configured
pub const DEFAULT_PIN: &str = "0102";

/// Default PIN length
pub const DEFAULT_PIN_LEN: usize = 4;

/// Message for a wrong PIN
pub const WRONG_PIN_MESSAGE: &str = "PIN incorrecto";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("PIN length must be at least 1")]
    ZeroLength,

    #[error("Configured PIN must be {expected} digits")]
    InvalidPin { expected: usize },
}

/// Result of checking one candidate PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    /// Not all digits, or the wrong length
    Malformed,
    Match,
    Mismatch,
}

/// The PIN the server accepts
#[derive(Clone)]
pub struct PinPolicy {
    pin: String,
    length: usize,
}

impl PinPolicy {
    pub fn new(pin: impl Into<String>, length: usize) -> Result<Self, PolicyError> {
        let pin = pin.into().trim().to_string();
        if length == 0 {
            return Err(PolicyError::ZeroLength);
        }
        if !is_pin_shaped(&pin, length) {
            return Err(PolicyError::InvalidPin { expected: length });
        }
        Ok(Self { pin, length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn check(&self, candidate: &str) -> PinCheck {
        if !is_pin_shaped(candidate, self.length) {
            PinCheck::Malformed
        } else if candidate == self.pin {
            PinCheck::Match
        } else {
            PinCheck::Mismatch
        }
    }

    /// Message returned for malformed submissions
    pub fn length_message(&self) -> String {
        format!("El PIN debe tener {} dígitos.", self.length)
    }
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            pin: DEFAULT_PIN.to_string(),
            length: DEFAULT_PIN_LEN,
        }
    }
}

impl std::fmt::Debug for PinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinPolicy")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

fn is_pin_shaped(pin: &str, length: usize) -> bool {
    pin.len() == length && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Build the application router
pub fn router(policy: PinPolicy) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(VERIFY_PATH, post(verify_pin))
        .with_state(Arc::new(policy))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn verify_pin(
    State(policy): State<Arc<PinPolicy>>,
    body: Bytes,
) -> (StatusCode, Json<VerifyPinResponse>) {
    let candidate = submitted_pin(&body);

    match policy.check(&candidate) {
        PinCheck::Malformed => {
            debug!(len = candidate.len(), "Malformed PIN submission");
            (
                StatusCode::BAD_REQUEST,
                Json(VerifyPinResponse::rejected(policy.length_message())),
            )
        }
        PinCheck::Match => {
            info!("PIN accepted");
            (StatusCode::OK, Json(VerifyPinResponse::accepted()))
        }
        PinCheck::Mismatch => {
            info!("PIN rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(VerifyPinResponse::rejected(WRONG_PIN_MESSAGE)),
            )
        }
    }
}

/// Pull `pin` out of a request body. Anything that is not a JSON object
/// with a string or numeric `pin` yields an empty candidate.
fn submitted_pin(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    match value.get("pin") {
        Some(Value::String(pin)) => pin.trim().to_string(),
        Some(Value::Number(pin)) => pin.to_string(),
        _ => String::new(),
    }
}
