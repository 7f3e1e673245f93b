//! PIN buffer with memory wiping

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// Number of digits in a complete PIN
pub const MAX_LEN: usize = 4;

/// Digits typed so far, never longer than [`MAX_LEN`]
///
/// The backing string is wiped when the buffer is cleared or dropped.
#[derive(Default)]
pub struct PinBuffer {
    digits: Zeroizing<String>,
}

impl PinBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            digits: Zeroizing::new(String::with_capacity(MAX_LEN)),
        }
    }

    /// Append a digit. Returns `false` if the character is not `0`-`9` or
    /// the buffer is already full.
    pub fn push(&mut self, digit: char) -> bool {
        if !digit.is_ascii_digit() || self.is_complete() {
            return false;
        }
        self.digits.push(digit);
        true
    }

    /// Remove the last digit. Returns `false` if the buffer was empty.
    pub fn pop(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    /// Wipe and empty the buffer
    pub fn clear(&mut self) {
        self.digits.zeroize();
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Whether all [`MAX_LEN`] digits are present
    pub fn is_complete(&self) -> bool {
        self.digits.len() == MAX_LEN
    }

    /// Copy of the digits for sending; wiped when the copy is dropped
    pub fn secret(&self) -> Zeroizing<String> {
        Zeroizing::new(self.digits.as_str().to_owned())
    }

    /// Indicator slots for the current length
    pub fn indicator(&self) -> [bool; MAX_LEN] {
        indicator(self.len())
    }
}

impl fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinBuffer").field("len", &self.len()).finish()
    }
}

/// Indicator row for a buffer of `len` digits: slot `i` is filled iff `i < len`
pub fn indicator(len: usize) -> [bool; MAX_LEN] {
    std::array::from_fn(|i| i < len)
}
