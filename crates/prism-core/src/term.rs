//! # Terms and Canonical Forms
//!
//! A `Term` is an unevaluated expression: one operator from the closed set
//! and its operands, already validated against the engine width.
//!
//! Canonicalization maps every term to a unique representative of its
//! equivalence class. For the commutative operators the rules run in order:
//!
//! 1. Identity elimination: drop `0` from `xor`/`bor`, drop all-ones from `band`
//! 2. Self-cancellation: paired `xor` operands cancel
//! 3. Idempotence: repeated `band`/`bor` operands collapse to one
//! 4. Commutative ordering: sort operands by value
//!
//! Unary terms are canonical as written.

use crate::primitives::MAX_TERM_OPERANDS;
use crate::quantum::QuantumLevel;
use crate::space::{Engine, Operator};
use crate::{Datum, Operand, PrismError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// TERM
// =============================================================================

/// A symbolic expression over datums of one width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Term {
    operator: Operator,
    operands: Vec<Datum>,
}

impl Term {
    /// Build a term, checking arity and that all operands share a width.
    pub fn new(operator: Operator, operands: Vec<Datum>) -> Result<Self, PrismError> {
        check_arity(operator, operands.len())?;
        if let Some(first) = operands.first() {
            if let Some(odd) = operands.iter().find(|d| d.level() != first.level()) {
                return Err(PrismError::Domain(format!(
                    "operand {} has width {}, expected {}",
                    odd,
                    odd.width(),
                    first.width()
                )));
            }
        }
        Ok(Self { operator, operands })
    }

    /// The term's operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The operands as written.
    #[must_use]
    pub fn operands(&self) -> &[Datum] {
        &self.operands
    }

    /// The level shared by all operands.
    #[must_use]
    pub fn level(&self) -> QuantumLevel {
        self.operands
            .first()
            .map(Datum::level)
            .unwrap_or_default()
    }

    /// Normalize this term. Deterministic and total.
    #[must_use]
    pub fn canonicalize(&self) -> Canonicalization {
        let level = self.level();
        let mut steps = Vec::new();

        if self.operator.is_unary() {
            return Canonicalization {
                term: CanonicalTerm {
                    operator: self.operator,
                    level,
                    operands: self.operands.clone(),
                },
                steps,
            };
        }

        let mut operands = self.operands.clone();

        if let Some(identity) = self.operator.identity(level) {
            let before = operands.len();
            operands.retain(|d| *d != identity);
            record(&mut steps, Rewrite::IdentityElimination, before, operands.len());
        }

        match self.operator {
            Operator::Xor => {
                let before = operands.len();
                let mut counts: BTreeMap<Datum, usize> = BTreeMap::new();
                for d in &operands {
                    *counts.entry(*d).or_insert(0) += 1;
                }
                // keep first occurrences of odd-multiplicity values, in input order
                let mut kept = BTreeSet::new();
                operands.retain(|d| counts.get(d).is_some_and(|n| n % 2 == 1) && kept.insert(*d));
                record(&mut steps, Rewrite::SelfCancellation, before, operands.len());
            }
            Operator::Band | Operator::Bor => {
                let before = operands.len();
                let mut seen = BTreeSet::new();
                operands.retain(|d| seen.insert(*d));
                record(&mut steps, Rewrite::Idempotence, before, operands.len());
            }
            Operator::Neg | Operator::Bnot | Operator::Succ | Operator::Pred => {}
        }

        if !operands.is_sorted() {
            operands.sort();
            steps.push(RewriteStep {
                rule: Rewrite::CommutativeOrdering,
                before: operands.len(),
                after: operands.len(),
            });
        }

        Canonicalization {
            term: CanonicalTerm {
                operator: self.operator,
                level,
                operands,
            },
            steps,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_application(f, self.operator, &self.operands)
    }
}

fn check_arity(operator: Operator, found: usize) -> Result<(), PrismError> {
    let (ok, expected) = if operator.is_unary() {
        (found == 1, "1".to_string())
    } else {
        (
            (1..=MAX_TERM_OPERANDS).contains(&found),
            format!("1..={}", MAX_TERM_OPERANDS),
        )
    };
    if ok {
        Ok(())
    } else {
        Err(PrismError::Arity {
            operator: operator.name().to_string(),
            expected,
            found,
        })
    }
}

fn record(steps: &mut Vec<RewriteStep>, rule: Rewrite, before: usize, after: usize) {
    if before != after {
        steps.push(RewriteStep {
            rule,
            before,
            after,
        });
    }
}

fn write_application(
    f: &mut fmt::Formatter<'_>,
    operator: Operator,
    operands: &[Datum],
) -> fmt::Result {
    write!(f, "{}(", operator)?;
    for (i, d) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", d)?;
    }
    write!(f, ")")
}

// =============================================================================
// CANONICAL FORM
// =============================================================================

/// A rewrite rule applied during canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rewrite {
    /// Identity operands removed.
    IdentityElimination,
    /// Paired `xor` operands cancelled.
    SelfCancellation,
    /// Repeated `band`/`bor` operands collapsed.
    Idempotence,
    /// Operands sorted into the total order.
    CommutativeOrdering,
}

/// One applied rewrite, with operand counts before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RewriteStep {
    /// The rule applied.
    pub rule: Rewrite,
    /// Operand count before the rule.
    pub before: usize,
    /// Operand count after the rule.
    pub after: usize,
}

/// The unique normalized representative of a term.
///
/// May have zero operands when everything cancelled; it then evaluates to
/// the operator's identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalTerm {
    operator: Operator,
    level: QuantumLevel,
    operands: Vec<Datum>,
}

/// The canonical term plus the rewrite trace that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalization {
    /// The canonical term.
    pub term: CanonicalTerm,
    /// Rewrites applied, in order. Empty when the input was already canonical.
    pub steps: Vec<RewriteStep>,
}

/// The byte layout hashed into a derivation id.
#[derive(Serialize)]
struct CanonicalEncoding<'a> {
    operator: &'a str,
    width: u8,
    operands: Vec<&'a [u8]>,
}

impl CanonicalTerm {
    /// The operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The canonical operand sequence.
    #[must_use]
    pub fn operands(&self) -> &[Datum] {
        &self.operands
    }

    /// The level of the term.
    #[must_use]
    pub fn level(&self) -> QuantumLevel {
        self.level
    }

    /// Evaluate by left-to-right fold from the operator's identity.
    pub fn evaluate(&self) -> Result<Datum, PrismError> {
        match self.operator.identity(self.level) {
            Some(identity) => self
                .operands
                .iter()
                .try_fold(identity, |acc, &d| acc.apply_binary(self.operator, d)),
            None => match self.operands.as_slice() {
                [x] => x.apply_unary(self.operator),
                other => Err(PrismError::Arity {
                    operator: self.operator.name().to_string(),
                    expected: "1".to_string(),
                    found: other.len(),
                }),
            },
        }
    }

    /// Deterministic postcard encoding of operator, width and operands.
    pub fn encode(&self) -> Result<Vec<u8>, PrismError> {
        let encoding = CanonicalEncoding {
            operator: self.operator.name(),
            width: self.level.width() as u8,
            operands: self.operands.iter().map(Datum::bytes).collect(),
        };
        postcard::to_allocvec(&encoding)
            .map_err(|e| PrismError::Serialization(format!("Canonical term: {}", e)))
    }
}

impl fmt::Display for CanonicalTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_application(f, self.operator, &self.operands)
    }
}

// =============================================================================
// ENGINE SURFACE
// =============================================================================

impl Engine {
    /// Build a term from an operator name and caller operands.
    ///
    /// Fails with `UnknownOperator` for names outside the closed set and
    /// `Domain` for operands that do not resolve at this engine's width.
    pub fn make_term<I, O>(&self, operator: &str, operands: I) -> Result<Term, PrismError>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let operator: Operator = operator.parse()?;
        let operands = operands
            .into_iter()
            .map(|o| self.datum(o))
            .collect::<Result<Vec<_>, _>>()?;
        Term::new(operator, operands)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn values(term: &CanonicalTerm) -> Vec<u64> {
        term.operands().iter().map(Datum::value).collect()
    }

    #[test]
    fn commutative_ordering() {
        let engine = Engine::q0();
        let a = engine.make_term("xor", [0xAA, 0x55]).expect("a").canonicalize();
        let b = engine.make_term("xor", [0x55, 0xAA]).expect("b").canonicalize();
        assert_eq!(a.term, b.term);
        assert_eq!(values(&a.term), vec![0x55, 0xAA]);
        assert_eq!(a.steps.last().map(|s| s.rule), Some(Rewrite::CommutativeOrdering));
        assert!(b.steps.is_empty());
    }

    #[test]
    fn xor_identity_elimination() {
        let engine = Engine::q0();
        let c = engine
            .make_term("xor", [0x55, 0x00, 0xAA])
            .expect("term")
            .canonicalize();
        assert_eq!(values(&c.term), vec![0x55, 0xAA]);
        assert_eq!(
            c.steps,
            vec![RewriteStep {
                rule: Rewrite::IdentityElimination,
                before: 3,
                after: 2
            }]
        );
    }

    #[test]
    fn xor_self_cancellation() {
        let engine = Engine::q0();
        let c = engine.make_term("xor", [0x55, 0x55]).expect("term").canonicalize();
        assert!(c.term.operands().is_empty());
        assert_eq!(c.term.evaluate().expect("eval").value(), 0);

        let odd = engine
            .make_term("xor", [7, 0x55, 7, 0x55, 7])
            .expect("term")
            .canonicalize();
        assert_eq!(values(&odd.term), vec![7]);
    }

    #[test]
    fn band_identity_and_idempotence() {
        let engine = Engine::q0();
        let c = engine
            .make_term("band", [0xF0, 0xFF, 0x0F, 0xF0])
            .expect("term")
            .canonicalize();
        assert_eq!(values(&c.term), vec![0x0F, 0xF0]);
        let rules: Vec<Rewrite> = c.steps.iter().map(|s| s.rule).collect();
        assert_eq!(
            rules,
            vec![
                Rewrite::IdentityElimination,
                Rewrite::Idempotence,
                Rewrite::CommutativeOrdering
            ]
        );
        assert_eq!(c.term.evaluate().expect("eval").value(), 0);
    }

    #[test]
    fn empty_canonical_forms_evaluate_to_identity() {
        let engine = Engine::q0();
        let band = engine.make_term("band", [0xFF]).expect("band").canonicalize();
        assert_eq!(band.term.evaluate().expect("eval").value(), 0xFF);
        let bor = engine.make_term("bor", [0x00]).expect("bor").canonicalize();
        assert_eq!(bor.term.evaluate().expect("eval").value(), 0x00);
    }

    #[test]
    fn unary_terms_untouched() {
        let engine = Engine::q0();
        let c = engine.make_term("neg", [42]).expect("term").canonicalize();
        assert_eq!(values(&c.term), vec![42]);
        assert!(c.steps.is_empty());
        assert_eq!(c.term.evaluate().expect("eval").value(), 214);
    }

    #[test]
    fn unknown_operator_rejected() {
        let engine = Engine::q0();
        assert!(matches!(
            engine.make_term("nand", [1, 2]),
            Err(PrismError::UnknownOperator(name)) if name == "nand"
        ));
    }

    #[test]
    fn arity_checked() {
        let engine = Engine::q0();
        assert!(matches!(
            engine.make_term("neg", [1, 2]),
            Err(PrismError::Arity { found: 2, .. })
        ));
        assert!(matches!(
            engine.make_term("xor", Vec::<u8>::new()),
            Err(PrismError::Arity { found: 0, .. })
        ));
    }

    #[test]
    fn out_of_domain_operand_rejected() {
        let engine = Engine::q0();
        assert!(matches!(
            engine.make_term("xor", [1, 256]),
            Err(PrismError::Domain(_))
        ));
    }

    #[test]
    fn mixed_width_term_rejected() {
        let a = Datum::from_bytes(&[1]).expect("a");
        let b = Datum::from_bytes(&[1, 2]).expect("b");
        assert!(Term::new(Operator::Xor, vec![a, b]).is_err());
    }

    #[test]
    fn encoding_distinguishes_width() {
        let q0 = Engine::q0();
        let q1 = Engine::q1();
        let a = q0.make_term("xor", [0, 0]).expect("a").canonicalize();
        let b = q1.make_term("xor", [0, 0]).expect("b").canonicalize();
        assert_ne!(a.term.encode().expect("a"), b.term.encode().expect("b"));
    }

    #[test]
    fn display() {
        let engine = Engine::q0();
        let term = engine.make_term("xor", [0xAA, 0x55]).expect("term");
        assert_eq!(term.to_string(), "xor(0xAA, 0x55)");
        assert_eq!(term.canonicalize().term.to_string(), "xor(0x55, 0xAA)");
    }
}
