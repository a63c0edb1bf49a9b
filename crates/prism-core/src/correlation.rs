//! # Correlation Engine
//!
//! Structural similarity between two datums of one width.
//!
//! - `totalDifference`: Hamming distance, popcount of `xor(a, b)`
//! - `maxDifference`: the bit width
//! - `fidelity`: `1 - totalDifference / maxDifference`, in `[0.0, 1.0]`
//!
//! Fidelity is the only floating-point value in the engine. Distances stay
//! integral; the ratio is formed once, at the edge.

use crate::space::Engine;
use crate::{Datum, Operand, PrismError};
use serde::Serialize;

/// Result of correlating two datums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    /// Normalized similarity in `[0.0, 1.0]`.
    pub fidelity: f64,
    /// Number of differing bits.
    pub total_difference: u32,
    /// Total bit width.
    pub max_difference: u32,
}

impl Correlation {
    /// Correlate two datums. Widths must match.
    pub fn between(a: Datum, b: Datum) -> Result<Self, PrismError> {
        let total_difference = a.xor(b)?.value().count_ones();
        let max_difference = a.level().bits();
        Ok(Self {
            fidelity: fidelity(total_difference, max_difference),
            total_difference,
            max_difference,
        })
    }

    /// Whether the two datums were identical.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.total_difference == 0
    }
}

#[allow(clippy::float_arithmetic)]
fn fidelity(total_difference: u32, max_difference: u32) -> f64 {
    1.0 - f64::from(total_difference) / f64::from(max_difference)
}

/// The best candidate found for one query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    /// Position of the winning candidate in the candidate list.
    pub index: usize,
    /// Correlation between the query and the winner.
    pub correlation: Correlation,
}

/// One row of a cross-schema correspondence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correspondence<'a, L> {
    /// Label from the source enumeration.
    pub source: &'a L,
    /// Best-matching label from the target enumeration.
    pub target: &'a L,
    /// Correlation between the two codes.
    pub correlation: Correlation,
}

impl Engine {
    /// Correlate `a` and `b` at this engine's width.
    pub fn correlate(
        &self,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> Result<Correlation, PrismError> {
        Correlation::between(self.datum(a)?, self.datum(b)?)
    }

    /// The candidate with maximal fidelity to `query`.
    ///
    /// Ties go to the first-seen candidate. `None` if `candidates` is empty.
    pub fn best_match(
        &self,
        query: impl Into<Operand>,
        candidates: &[Datum],
    ) -> Result<Option<Match>, PrismError> {
        let query = self.datum(query)?;
        let mut best: Option<Match> = None;
        for (index, &candidate) in candidates.iter().enumerate() {
            let correlation = Correlation::between(query, self.datum(candidate)?)?;
            // strict: an equal distance never displaces an earlier candidate
            let better = best.is_none_or(|b| {
                correlation.total_difference < b.correlation.total_difference
            });
            if better {
                best = Some(Match { index, correlation });
            }
        }
        Ok(best)
    }

    /// Map each labelled source code onto its best target code.
    ///
    /// Iteration follows the slice order of both enumerations, so the result
    /// is deterministic.
    pub fn match_enumerations<'a, L>(
        &self,
        source: &'a [(L, Datum)],
        target: &'a [(L, Datum)],
    ) -> Result<Vec<Correspondence<'a, L>>, PrismError> {
        let codes: Vec<Datum> = target.iter().map(|(_, code)| *code).collect();
        let mut rows = Vec::with_capacity(source.len());
        for (label, code) in source {
            if let Some(found) = self.best_match(*code, &codes)? {
                rows.push(Correspondence {
                    source: label,
                    target: &target[found.index].0,
                    correlation: found.correlation,
                });
            }
        }
        Ok(rows)
    }

    /// Mean per-position fidelity of two equal-length datum sequences.
    #[allow(clippy::float_arithmetic)]
    pub fn mean_fidelity(&self, a: &[Datum], b: &[Datum]) -> Result<f64, PrismError> {
        if a.is_empty() || a.len() != b.len() {
            return Err(PrismError::Domain(format!(
                "pattern lengths must be equal and non-zero, got {} and {}",
                a.len(),
                b.len()
            )));
        }
        let mut sum = 0.0;
        for (&x, &y) in a.iter().zip(b) {
            sum += self.correlate(x, y)?.fidelity;
        }
        Ok(sum / a.len() as f64)
    }
}
