//! # Algebraic Space
//!
//! The finite cyclic group of `w`-byte tuples and its closed set of total
//! operations.
//!
//! Every operation funnels its result through `Datum::masked`, so results
//! are confined to `[0, 256^w)` for every input by construction. The law
//! verifier then checks that this holds exhaustively.
//!
//! ## Operations
//!
//! | Operator | Arity | Definition |
//! |----------|-------|------------|
//! | `neg`    | 1     | `-x mod cycle` |
//! | `bnot`   | 1     | every bit flipped |
//! | `succ`   | 1     | `x + 1 mod cycle` |
//! | `pred`   | 1     | `x - 1 mod cycle` |
//! | `xor`    | n     | per-byte exclusive or |
//! | `band`   | n     | per-byte and |
//! | `bor`    | n     | per-byte or |
//!
//! The critical identity `neg(bnot(x)) == succ(x)` ties the additive view
//! to the bitwise view.

use crate::primitives::EXHAUSTIVE_LIMIT;
use crate::quantum::QuantumLevel;
use crate::{Datum, Operand, PrismError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// OPERATOR SET
// =============================================================================

/// The closed set of operators over the space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Additive inverse.
    Neg,
    /// Bitwise complement.
    Bnot,
    /// Additive increment.
    Succ,
    /// Additive decrement.
    Pred,
    /// Per-byte exclusive or.
    Xor,
    /// Per-byte and.
    Band,
    /// Per-byte or.
    Bor,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Neg,
        Self::Bnot,
        Self::Succ,
        Self::Pred,
        Self::Xor,
        Self::Band,
        Self::Bor,
    ];

    /// The operator's canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Bnot => "bnot",
            Self::Succ => "succ",
            Self::Pred => "pred",
            Self::Xor => "xor",
            Self::Band => "band",
            Self::Bor => "bor",
        }
    }

    /// Unary operators take exactly one operand and are never reordered.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Neg | Self::Bnot | Self::Succ | Self::Pred)
    }

    /// The identity element of an n-ary operator at the given level.
    ///
    /// `None` for unary operators.
    #[must_use]
    pub fn identity(self, level: QuantumLevel) -> Option<Datum> {
        match self {
            Self::Xor | Self::Bor => Some(Datum::zero(level)),
            Self::Band => Some(Datum::ones(level)),
            Self::Neg | Self::Bnot | Self::Succ | Self::Pred => None,
        }
    }
}

impl FromStr for Operator {
    type Err = PrismError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| PrismError::UnknownOperator(name.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// DATUM KERNEL
// =============================================================================

impl Datum {
    /// `-x mod cycle`.
    #[must_use]
    pub fn neg(self) -> Self {
        Self::masked(self.value().wrapping_neg(), self.level())
    }

    /// Bitwise complement.
    #[must_use]
    pub fn bnot(self) -> Self {
        Self::masked(!self.value(), self.level())
    }

    /// `x + 1 mod cycle`.
    #[must_use]
    pub fn succ(self) -> Self {
        Self::masked(self.value().wrapping_add(1), self.level())
    }

    /// `x - 1 mod cycle`.
    #[must_use]
    pub fn pred(self) -> Self {
        Self::masked(self.value().wrapping_sub(1), self.level())
    }

    /// Per-byte exclusive or. Both operands must share a width.
    pub fn xor(self, other: Self) -> Result<Self, PrismError> {
        self.zip(other, |a, b| a ^ b)
    }

    /// Per-byte and. Both operands must share a width.
    pub fn band(self, other: Self) -> Result<Self, PrismError> {
        self.zip(other, |a, b| a & b)
    }

    /// Per-byte or. Both operands must share a width.
    pub fn bor(self, other: Self) -> Result<Self, PrismError> {
        self.zip(other, |a, b| a | b)
    }

    /// Apply a unary operator.
    pub fn apply_unary(self, op: Operator) -> Result<Self, PrismError> {
        match op {
            Operator::Neg => Ok(self.neg()),
            Operator::Bnot => Ok(self.bnot()),
            Operator::Succ => Ok(self.succ()),
            Operator::Pred => Ok(self.pred()),
            Operator::Xor | Operator::Band | Operator::Bor => Err(PrismError::Arity {
                operator: op.name().to_string(),
                expected: "2 or more".to_string(),
                found: 1,
            }),
        }
    }

    /// Apply a binary operator.
    pub fn apply_binary(self, op: Operator, other: Self) -> Result<Self, PrismError> {
        match op {
            Operator::Xor => self.xor(other),
            Operator::Band => self.band(other),
            Operator::Bor => self.bor(other),
            Operator::Neg | Operator::Bnot | Operator::Succ | Operator::Pred => {
                Err(PrismError::Arity {
                    operator: op.name().to_string(),
                    expected: "1".to_string(),
                    found: 2,
                })
            }
        }
    }

    /// Bitwise operators act on each byte independently, which is the same
    /// as acting on the big-endian integer.
    fn zip(self, other: Self, f: impl Fn(u64, u64) -> u64) -> Result<Self, PrismError> {
        if self.level() != other.level() {
            return Err(PrismError::Domain(format!(
                "width mismatch: {} has {} bytes, {} has {}",
                self,
                self.width(),
                other,
                other.width()
            )));
        }
        Ok(Self::masked(f(self.value(), other.value()), self.level()))
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The algebraic space at one quantum level.
///
/// Owns nothing mutable beyond a cached "verified" flag written by the law
/// verifier. All operations take `&self`, so one engine may be shared across
/// threads; concurrent verifications all write the same value.
#[derive(Debug)]
pub struct Engine {
    level: QuantumLevel,
    verified: AtomicBool,
}

impl Engine {
    /// Create an engine at quantum level `level`.
    pub fn new(level: u8) -> Result<Self, PrismError> {
        Ok(Self::with_level(QuantumLevel::new(level)?))
    }

    /// Create an engine at an already-validated level.
    #[must_use]
    pub fn with_level(level: QuantumLevel) -> Self {
        Self {
            level,
            verified: AtomicBool::new(false),
        }
    }

    /// One-byte engine (256 states).
    #[must_use]
    pub fn q0() -> Self {
        Self::with_level(QuantumLevel::Q0)
    }

    /// Two-byte engine (65 536 states).
    #[must_use]
    pub fn q1() -> Self {
        Self::with_level(QuantumLevel::Q1)
    }

    /// The engine's quantum level.
    #[must_use]
    pub fn level(&self) -> QuantumLevel {
        self.level
    }

    /// Tuple width in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        self.level.width()
    }

    /// Total bit width.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.level.bits()
    }

    /// Number of states in the space.
    #[must_use]
    pub fn cycle(&self) -> u128 {
        self.level.cycle()
    }

    /// Whether the last law verification on this engine passed.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified.load(Ordering::Acquire)
    }

    pub(crate) fn set_verified(&self, verified: bool) {
        self.verified.store(verified, Ordering::Release);
    }

    /// Resolve a caller operand to a datum of this engine's width.
    pub fn datum(&self, x: impl Into<Operand>) -> Result<Datum, PrismError> {
        x.into().resolve(self.level)
    }

    /// The all-zero datum.
    #[must_use]
    pub fn zero(&self) -> Datum {
        Datum::zero(self.level)
    }

    /// The all-ones datum.
    #[must_use]
    pub fn ones(&self) -> Datum {
        Datum::ones(self.level)
    }

    /// Every datum of the space in ascending order.
    ///
    /// Enumerating levels above Q2 is intractable; callers bound their use.
    pub fn domain(&self) -> impl Iterator<Item = Datum> + use<> {
        let level = self.level;
        (0..=level.mask()).map(move |value| Datum::masked(value, level))
    }

    // -------------------------------------------------------------------------
    // Unary operations
    // -------------------------------------------------------------------------

    /// Additive inverse. `neg(neg(x)) == x`.
    pub fn neg(&self, x: impl Into<Operand>) -> Result<Datum, PrismError> {
        Ok(self.datum(x)?.neg())
    }

    /// Bitwise complement. `bnot(bnot(x)) == x`.
    pub fn bnot(&self, x: impl Into<Operand>) -> Result<Datum, PrismError> {
        Ok(self.datum(x)?.bnot())
    }

    /// Successor. `succ(x) == neg(bnot(x))`.
    pub fn succ(&self, x: impl Into<Operand>) -> Result<Datum, PrismError> {
        Ok(self.datum(x)?.succ())
    }

    /// Predecessor. `pred(x) == bnot(neg(x))`.
    pub fn pred(&self, x: impl Into<Operand>) -> Result<Datum, PrismError> {
        Ok(self.datum(x)?.pred())
    }

    // -------------------------------------------------------------------------
    // Binary operations
    // -------------------------------------------------------------------------

    /// Per-byte exclusive or.
    pub fn xor(&self, x: impl Into<Operand>, y: impl Into<Operand>) -> Result<Datum, PrismError> {
        self.datum(x)?.xor(self.datum(y)?)
    }

    /// Per-byte and.
    pub fn band(
        &self,
        x: impl Into<Operand>,
        y: impl Into<Operand>,
    ) -> Result<Datum, PrismError> {
        self.datum(x)?.band(self.datum(y)?)
    }

    /// Per-byte or.
    pub fn bor(&self, x: impl Into<Operand>, y: impl Into<Operand>) -> Result<Datum, PrismError> {
        self.datum(x)?.bor(self.datum(y)?)
    }

    // -------------------------------------------------------------------------
    // Orbits
    // -------------------------------------------------------------------------

    /// Every state reached from `start` by applying `generators` round-robin.
    ///
    /// The walk stops once a full round lands back on `start`, or after
    /// `cycle` rounds. Alternating `bnot` and `neg` composes to `succ`, so
    /// that pair reaches the entire space.
    pub fn orbit(
        &self,
        start: impl Into<Operand>,
        generators: &[Operator],
    ) -> Result<BTreeSet<Datum>, PrismError> {
        if generators.is_empty() {
            return Err(PrismError::Domain("orbit needs at least one generator".to_string()));
        }
        if let Some(op) = generators.iter().find(|op| !op.is_unary()) {
            return Err(PrismError::Arity {
                operator: op.name().to_string(),
                expected: "1".to_string(),
                found: 2,
            });
        }
        if self.cycle() > u128::from(EXHAUSTIVE_LIMIT) {
            return Err(PrismError::Domain(format!(
                "orbit walk over {} exceeds the enumeration limit",
                self.level
            )));
        }

        let start = self.datum(start)?;
        let mut visited = BTreeSet::from([start]);
        let mut current = start;
        for _ in 0..self.cycle() {
            for &op in generators {
                current = current.apply_unary(op)?;
                visited.insert(current);
            }
            if current == start {
                break;
            }
        }
        Ok(visited)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::q0()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_identity_examples() {
        let engine = Engine::q0();
        for x in [0u8, 42, 127, 254, 255] {
            let lhs = engine.neg(engine.bnot(x).expect("bnot")).expect("neg");
            assert_eq!(lhs, engine.succ(x).expect("succ"));
        }
    }

    #[test]
    fn navigation_at_q0() {
        let engine = Engine::q0();
        assert_eq!(engine.succ(42).expect("succ").value(), 43);
        assert_eq!(engine.pred(42).expect("pred").value(), 41);
        assert_eq!(engine.neg(42).expect("neg").value(), 214);
        assert_eq!(engine.bnot(42).expect("bnot").value(), 213);
        assert_eq!(engine.succ(255).expect("wrap").value(), 0);
        assert_eq!(engine.pred(0).expect("wrap").value(), 255);
    }

    #[test]
    fn multi_byte_carry() {
        let engine = Engine::new(2).expect("q2");
        let x = engine.datum([0u8, 0xFF, 0xFF]).expect("x");
        assert_eq!(engine.succ(x).expect("succ").bytes(), &[1, 0, 0]);
        assert_eq!(engine.neg(1).expect("neg").bytes(), &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn widest_level_wraps() {
        let engine = Engine::new(7).expect("q7");
        let max = engine.ones();
        assert_eq!(engine.succ(max).expect("succ"), engine.zero());
        assert_eq!(engine.neg(engine.zero()).expect("neg"), engine.zero());
    }

    #[test]
    fn binary_ops_per_byte() {
        let engine = Engine::new(1).expect("q1");
        let a = engine.datum([0xF0u8, 0x0F]).expect("a");
        let b = engine.datum([0xFFu8, 0x00]).expect("b");
        assert_eq!(engine.xor(a, b).expect("xor").bytes(), &[0x0F, 0x0F]);
        assert_eq!(engine.band(a, b).expect("band").bytes(), &[0xF0, 0x00]);
        assert_eq!(engine.bor(a, b).expect("bor").bytes(), &[0xFF, 0x0F]);
    }

    #[test]
    fn width_mismatch_rejected() {
        let wide = Datum::from_bytes(&[1, 2]).expect("wide");
        let narrow = Datum::from_bytes(&[1]).expect("narrow");
        assert!(matches!(wide.xor(narrow), Err(PrismError::Domain(_))));
        assert!(matches!(Engine::q0().neg(wide), Err(PrismError::Domain(_))));
    }

    #[test]
    fn operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.name().parse::<Operator>().expect("parse"), op);
        }
        assert!(matches!(
            "nand".parse::<Operator>(),
            Err(PrismError::UnknownOperator(_))
        ));
    }

    #[test]
    fn identities() {
        let level = QuantumLevel::Q0;
        assert_eq!(Operator::Xor.identity(level), Some(Datum::zero(level)));
        assert_eq!(Operator::Band.identity(level), Some(Datum::ones(level)));
        assert_eq!(Operator::Neg.identity(level), None);
    }

    #[test]
    fn apply_checks_arity() {
        let x = Datum::from_bytes(&[1]).expect("x");
        assert!(x.apply_unary(Operator::Xor).is_err());
        assert!(x.apply_binary(Operator::Neg, x).is_err());
        assert_eq!(x.apply_unary(Operator::Succ).expect("succ").value(), 2);
    }

    #[test]
    fn alternating_neg_bnot_reaches_whole_space() {
        let engine = Engine::q0();
        let reached = engine
            .orbit(73, &[Operator::Bnot, Operator::Neg])
            .expect("orbit");
        assert_eq!(reached.len(), 256);
    }

    #[test]
    fn involution_orbit_is_small() {
        let engine = Engine::q0();
        let reached = engine.orbit(73, &[Operator::Bnot]).expect("orbit");
        assert_eq!(reached.len(), 2);
    }

    #[test]
    fn orbit_rejects_binary_generators() {
        let engine = Engine::q0();
        assert!(engine.orbit(1, &[Operator::Xor]).is_err());
        assert!(engine.orbit(1, &[]).is_err());
    }

    #[test]
    fn domain_is_ascending_and_complete() {
        let engine = Engine::q0();
        let values: Vec<u64> = engine.domain().map(|d| d.value()).collect();
        assert_eq!(values.len(), 256);
        assert!(values.windows(2).all(|w| w[0] + 1 == w[1]));
    }
}
