//! Reusable UI components

pub mod keypad;
pub mod pin_dots;
pub mod spinner;
