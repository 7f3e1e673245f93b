//! posgate TUI library
//!
//! Terminal front-end for the PIN gate: the PIN screen with its keypad and
//! loading overlay, and the protected panel reached after a valid PIN.

pub mod app;
pub mod ui;

pub use app::App;
