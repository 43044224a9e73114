//! Concurrency ceiling for one run.

use std::fmt;

/// Number of simultaneous fetches, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(u8);

/// Requested concurrency outside the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("concurrency must be between {min} and {max}, got {got}", min = Concurrency::MIN, max = Concurrency::MAX)]
pub struct InvalidConcurrency {
    pub got: usize,
}

impl Concurrency {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(n: usize) -> Result<Self, InvalidConcurrency> {
        if (Self::MIN as usize..=Self::MAX as usize).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(InvalidConcurrency { got: n })
        }
    }

    /// Clamp into range instead of rejecting (used for config values).
    pub fn clamped(n: usize) -> Self {
        Self(n.clamp(Self::MIN as usize, Self::MAX as usize) as u8)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
