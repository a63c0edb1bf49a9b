//! # Core Type Definitions
//!
//! This module contains the value types of the PRISM algebraic space:
//! - The datum (`Datum`), an immutable fixed-width byte tuple
//! - Caller-side operand conversion (`Operand`)
//! - Error types (`PrismError`)
//!
//! ## Value Semantics
//!
//! All types in this module:
//! - Are constructed once and compared by value
//! - Validate eagerly at construction; a `Datum` that exists is in-domain
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use crate::primitives::MAX_WIDTH;
use crate::quantum::QuantumLevel;
use crate::verify::Law;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

// =============================================================================
// DATUM
// =============================================================================

/// An immutable `w`-byte tuple, the fundamental value of the space.
///
/// Bytes are stored big-endian in the first `width` slots; unused slots stay
/// zero, so the derived ordering is numeric within one width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Datum {
    level: QuantumLevel,
    bytes: [u8; MAX_WIDTH],
}

impl Datum {
    /// Build a datum from an explicit byte tuple. The width is the tuple length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrismError> {
        let level = QuantumLevel::from_width(bytes.len())?;
        let mut slots = [0u8; MAX_WIDTH];
        slots[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            level,
            bytes: slots,
        })
    }

    /// Build a datum of the given level from its integer value (big-endian).
    pub fn from_value(value: u64, level: QuantumLevel) -> Result<Self, PrismError> {
        if value > level.mask() {
            return Err(PrismError::Domain(format!(
                "value {} does not fit {} ({} bytes)",
                value,
                level,
                level.width()
            )));
        }
        Ok(Self::masked(value, level))
    }

    /// The all-zero datum: identity of `xor` and `bor`.
    #[must_use]
    pub fn zero(level: QuantumLevel) -> Self {
        Self::masked(0, level)
    }

    /// The all-ones datum: identity of `band`.
    #[must_use]
    pub fn ones(level: QuantumLevel) -> Self {
        Self::masked(u64::MAX, level)
    }

    /// Build a datum from a value, discarding bits above the level's width.
    ///
    /// This is the single confinement point every operation goes through.
    pub(crate) fn masked(value: u64, level: QuantumLevel) -> Self {
        let width = level.width();
        let value = value & level.mask();
        let mut bytes = [0u8; MAX_WIDTH];
        let be = value.to_be_bytes();
        bytes[..width].copy_from_slice(&be[MAX_WIDTH - width..]);
        Self { level, bytes }
    }

    /// Width in bytes.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.level.width()
    }

    /// The quantum level matching this datum's width.
    #[must_use]
    pub const fn level(&self) -> QuantumLevel {
        self.level
    }

    /// The byte tuple, most significant byte first.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.width()]
    }

    /// The integer value of the tuple (big-endian).
    #[must_use]
    pub fn value(&self) -> u64 {
        self.bytes()
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.bytes() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// OPERAND
// =============================================================================

/// Anything a caller may hand to the engine in place of a datum.
///
/// Resolution against an engine's level is the boundary where domain errors
/// surface; nothing is clamped or truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// An already-constructed datum. Its width must match the engine.
    Datum(Datum),
    /// A non-negative integer, laid out big-endian over the engine width.
    Int(i128),
    /// An explicit byte tuple. Its length must match the engine width.
    Bytes(Vec<u8>),
}

impl Operand {
    /// Resolve this operand to a datum of the given level.
    pub fn resolve(&self, level: QuantumLevel) -> Result<Datum, PrismError> {
        match self {
            Self::Datum(datum) => {
                if datum.width() != level.width() {
                    return Err(PrismError::Domain(format!(
                        "datum {} has width {}, engine {} expects {}",
                        datum,
                        datum.width(),
                        level,
                        level.width()
                    )));
                }
                Ok(*datum)
            }
            Self::Int(value) => {
                if *value < 0 || *value > i128::from(level.mask()) {
                    return Err(PrismError::Domain(format!(
                        "integer {} outside [0, {}) for {}",
                        value,
                        level.cycle(),
                        level
                    )));
                }
                Datum::from_value(*value as u64, level)
            }
            Self::Bytes(bytes) => {
                if bytes.len() != level.width() {
                    return Err(PrismError::Domain(format!(
                        "byte tuple of length {}, engine {} expects {}",
                        bytes.len(),
                        level,
                        level.width()
                    )));
                }
                Datum::from_bytes(bytes)
            }
        }
    }
}

impl From<Datum> for Operand {
    fn from(datum: Datum) -> Self {
        Self::Datum(datum)
    }
}

impl From<&Datum> for Operand {
    fn from(datum: &Datum) -> Self {
        Self::Datum(*datum)
    }
}

macro_rules! operand_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Int(value as i128)
                }
            }
        )*
    };
}

operand_from_int!(u8, u16, u32, u64, usize, i32, i64);

impl From<Vec<u8>> for Operand {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Operand {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Operand {
    fn from(bytes: [u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the PRISM engine.
///
/// - No silent failures
/// - Use `Result<T, PrismError>` for fallible operations
/// - Every operation is deterministic, so retrying reproduces the same error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrismError {
    /// A value lies outside the byte-tuple domain, or widths disagree.
    #[error("Domain error: {0}")]
    Domain(String),

    /// A term or closure operation names an operator outside the closed set.
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// An operator received the wrong number of operands.
    #[error("Arity error: {operator} expects {expected} operand(s), found {found}")]
    Arity {
        /// Operator name.
        operator: String,
        /// Accepted operand count, rendered for humans.
        expected: String,
        /// Operand count supplied.
        found: usize,
    },

    /// An algebraic law failed. The engine must not be trusted.
    #[error("Coherence error: law {law} violated at {input}")]
    Coherence {
        /// The first law that failed.
        law: Law,
        /// The failing input, rendered to reproduce the failure.
        input: String,
    },

    /// A `GraphClosed` emission produced edges leaving the node set.
    #[error("Closure violation: {dangling} dangling edge(s) in a graph-closed emission")]
    ClosureViolation {
        /// Number of edges whose target is not an emitted node.
        dangling: usize,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred (command-line layer only).
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn q(level: u8) -> QuantumLevel {
        QuantumLevel::new(level).expect("level")
    }

    #[test]
    fn from_value_is_big_endian() {
        let datum = Datum::from_value(0x00FF_0102, q(3)).expect("datum");
        assert_eq!(datum.bytes(), &[0x00, 0xFF, 0x01, 0x02]);
        assert_eq!(datum.value(), 0x00FF_0102);
        assert_eq!(datum.width(), 4);
    }

    #[test]
    fn from_value_rejects_overflow() {
        assert!(matches!(
            Datum::from_value(256, QuantumLevel::Q0),
            Err(PrismError::Domain(_))
        ));
    }

    #[test]
    fn from_bytes_rejects_bad_widths() {
        assert!(Datum::from_bytes(&[]).is_err());
        assert!(Datum::from_bytes(&[0; 9]).is_err());
        assert_eq!(Datum::from_bytes(&[1, 2]).expect("two").level(), QuantumLevel::Q1);
    }

    #[test]
    fn zero_and_ones() {
        assert_eq!(Datum::zero(q(2)).bytes(), &[0, 0, 0]);
        assert_eq!(Datum::ones(q(2)).bytes(), &[0xFF, 0xFF, 0xFF]);
        assert_eq!(Datum::ones(q(7)).value(), u64::MAX);
    }

    #[test]
    fn ordering_is_numeric_within_width() {
        let a = Datum::from_value(0x0100, QuantumLevel::Q1).expect("a");
        let b = Datum::from_value(0x00FF, QuantumLevel::Q1).expect("b");
        assert!(b < a);
    }

    #[test]
    fn display_is_full_width_hex() {
        let datum = Datum::from_bytes(&[255, 0, 0]).expect("red");
        assert_eq!(datum.to_string(), "0xFF0000");
    }

    #[test]
    fn serde_uses_byte_arrays() {
        let datum = Datum::from_bytes(&[1, 2, 3]).expect("datum");
        let json = serde_json::to_string(&datum).expect("json");
        assert_eq!(json, "[1,2,3]");
        let back: Datum = serde_json::from_str(&json).expect("back");
        assert_eq!(back, datum);
    }

    #[test]
    fn operand_resolution() {
        let level = q(2);
        assert_eq!(
            Operand::from(0x55u8).resolve(level).expect("int").bytes(),
            &[0, 0, 0x55]
        );
        assert_eq!(
            Operand::from([255u8, 0, 0]).resolve(level).expect("tuple").value(),
            0xFF_0000
        );
        assert!(Operand::from(-1i32).resolve(level).is_err());
        assert!(Operand::from(1u64 << 24).resolve(level).is_err());
        assert!(Operand::from(vec![1u8, 2]).resolve(level).is_err());

        let narrow = Datum::from_value(1, QuantumLevel::Q0).expect("narrow");
        assert!(matches!(
            Operand::from(narrow).resolve(level),
            Err(PrismError::Domain(_))
        ));
    }

    #[test]
    fn error_messages() {
        let err = PrismError::UnknownOperator("nand".to_string());
        assert_eq!(err.to_string(), "Unknown operator: nand");

        let err = PrismError::ClosureViolation { dangling: 3 };
        assert!(err.to_string().contains("3 dangling"));
    }
}
