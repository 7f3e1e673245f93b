//! Screen implementations

pub mod panel;
pub mod pin_entry;
