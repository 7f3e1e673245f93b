//! posgate core - PIN gate for the point-of-sale terminal
//!
//! This crate holds everything the gate needs that is independent of how it
//! is drawn: the PIN buffer, the submission state machine with its loading
//! and grace timing, the `/verify-pin` HTTP contract, and the anonymous
//! identity bootstrap used for later authenticated calls.

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod pin;
pub mod timer;
pub mod verify;

pub use config::{GateConfig, GateMessages, TimingPolicy};
pub use controller::{
    GateEvent, KeyInput, KeypadButton, PinEntryController, SubmissionState, SubmitResult,
};
pub use error::{GateError, Result};
pub use identity::{
    FirebaseAuth, FirebaseConfig, IdentityBootstrap, IdentityError, IdentityProvider, Principal,
    DEFAULT_IDENTITY_ENDPOINT,
};
pub use pin::{indicator, PinBuffer, MAX_LEN};
pub use timer::DelayedTask;
pub use verify::{
    HttpPinVerifier, PinVerifier, VerificationOutcome, VerifyPinRequest, VerifyPinResponse,
};

/// Default path of the verification endpoint
pub const VERIFY_PATH: &str = "/verify-pin";

/// Route the user is sent to once the PIN is accepted
pub const PROTECTED_ROUTE: &str = "/panel";
