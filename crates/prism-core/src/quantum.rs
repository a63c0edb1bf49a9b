//! # Quantum Parameterization
//!
//! A quantum level `q` fixes the tuple width of the algebraic space at
//! `q + 1` bytes. Bit width and cycle size follow from it; everything else
//! in the engine is generic over this one parameter.

use crate::PrismError;
use crate::primitives::{BYTE_BITS, MAX_QUANTUM_LEVEL, MAX_WIDTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated quantum level in `0..=MAX_QUANTUM_LEVEL`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct QuantumLevel(u8);

impl QuantumLevel {
    /// Quantum 0: one byte, 256 states.
    pub const Q0: Self = Self(0);

    /// Quantum 1: two bytes, 65 536 states.
    pub const Q1: Self = Self(1);

    /// Create a quantum level, rejecting levels above `MAX_QUANTUM_LEVEL`.
    pub fn new(level: u8) -> Result<Self, PrismError> {
        if level > MAX_QUANTUM_LEVEL {
            return Err(PrismError::Domain(format!(
                "quantum level {} exceeds maximum {}",
                level, MAX_QUANTUM_LEVEL
            )));
        }
        Ok(Self(level))
    }

    /// The quantum level whose tuples are `width` bytes wide.
    pub fn from_width(width: usize) -> Result<Self, PrismError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(PrismError::Domain(format!(
                "datum width {} outside 1..={}",
                width, MAX_WIDTH
            )));
        }
        Ok(Self((width - 1) as u8))
    }

    /// The raw level number.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Tuple width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        self.0 as usize + 1
    }

    /// Total bit width.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.width() as u32 * BYTE_BITS
    }

    /// Number of states, `256^width`.
    ///
    /// Reported as `u128` so the 8-byte level (2^64 states) is representable.
    #[must_use]
    pub const fn cycle(self) -> u128 {
        1u128 << self.bits()
    }

    /// All-ones mask over the level's bit width.
    #[must_use]
    pub const fn mask(self) -> u64 {
        if self.bits() >= u64::BITS {
            u64::MAX
        } else {
            (1u64 << self.bits()) - 1
        }
    }
}

impl TryFrom<u8> for QuantumLevel {
    type Error = PrismError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<QuantumLevel> for u8 {
    fn from(level: QuantumLevel) -> Self {
        level.0
    }
}

impl fmt::Display for QuantumLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}
