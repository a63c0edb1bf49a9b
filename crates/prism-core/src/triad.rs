//! # Triadic Decomposition
//!
//! Three views of one datum:
//! - `datum`: identity, the raw byte tuple
//! - `stratum`: magnitude, the popcount of each byte
//! - `spectrum`: structure, the set bit positions of each byte
//!
//! The views are pure functions of the datum and cost O(width).

use crate::space::Engine;
use crate::{Datum, Operand, PrismError};
use serde::Serialize;

/// The triadic coordinate of a datum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Triad {
    /// The original byte tuple.
    pub datum: Datum,
    /// Popcount per byte, each in `0..=8`.
    pub stratum: Vec<u8>,
    /// Set bit positions per byte, ascending, each in `0..=7`.
    pub spectrum: Vec<Vec<u8>>,
    /// Sum of `stratum`.
    pub total_stratum: u32,
}

impl Triad {
    /// Decompose a datum.
    #[must_use]
    pub fn of(datum: Datum) -> Self {
        let stratum = stratum_of(datum);
        let total_stratum = stratum.iter().map(|&s| u32::from(s)).sum();
        Self {
            datum,
            stratum,
            spectrum: spectrum_of(datum),
            total_stratum,
        }
    }

    /// Rebuild the datum from the spectrum alone.
    pub fn recompose(&self) -> Result<Datum, PrismError> {
        let mut bytes = Vec::with_capacity(self.spectrum.len());
        for bits in &self.spectrum {
            let mut byte = 0u8;
            for &bit in bits {
                if bit > 7 {
                    return Err(PrismError::Domain(format!(
                        "spectrum bit {} outside 0..=7",
                        bit
                    )));
                }
                byte |= 1 << bit;
            }
            bytes.push(byte);
        }
        Datum::from_bytes(&bytes)
    }

    /// Whether the three views agree: `stratum[i] == |spectrum[i]|` and the
    /// spectrum recomposes to the datum.
    #[must_use]
    pub fn is_faithful(&self) -> bool {
        let counts_agree = self.stratum.len() == self.spectrum.len()
            && self
                .stratum
                .iter()
                .zip(&self.spectrum)
                .all(|(&count, bits)| usize::from(count) == bits.len());
        counts_agree && self.recompose().is_ok_and(|datum| datum == self.datum)
    }
}

/// Popcount of one byte.
pub(crate) fn byte_stratum(byte: u8) -> u8 {
    byte.count_ones() as u8
}

/// Set bit positions of one byte, ascending.
pub(crate) fn byte_spectrum(byte: u8) -> impl Iterator<Item = u8> {
    (0u8..8).filter(move |&bit| byte & (1u8 << bit) != 0)
}

/// Popcount of every byte of `datum`.
#[must_use]
pub fn stratum_of(datum: Datum) -> Vec<u8> {
    datum.bytes().iter().map(|&byte| byte_stratum(byte)).collect()
}

/// Set bit positions of every byte of `datum`.
#[must_use]
pub fn spectrum_of(datum: Datum) -> Vec<Vec<u8>> {
    datum
        .bytes()
        .iter()
        .map(|&byte| byte_spectrum(byte).collect())
        .collect()
}

impl Engine {
    /// The triadic coordinate of `x`.
    pub fn triad(&self, x: impl Into<Operand>) -> Result<Triad, PrismError> {
        Ok(Triad::of(self.datum(x)?))
    }

    /// Per-byte popcount of `x`.
    pub fn stratum(&self, x: impl Into<Operand>) -> Result<Vec<u8>, PrismError> {
        Ok(stratum_of(self.datum(x)?))
    }

    /// Per-byte set bit positions of `x`.
    pub fn spectrum(&self, x: impl Into<Operand>) -> Result<Vec<Vec<u8>>, PrismError> {
        Ok(spectrum_of(self.datum(x)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triad_of_42() {
        let triad = Engine::q0().triad(42).expect("triad");
        assert_eq!(triad.datum.bytes(), &[42]);
        assert_eq!(triad.stratum, vec![3]);
        assert_eq!(triad.spectrum, vec![vec![1, 3, 5]]);
        assert_eq!(triad.total_stratum, 3);
    }

    #[test]
    fn extremes() {
        let engine = Engine::q0();
        let zero = engine.triad(0).expect("zero");
        assert_eq!(zero.stratum, vec![0]);
        assert!(zero.spectrum[0].is_empty());

        let full = engine.triad(255).expect("full");
        assert_eq!(full.stratum, vec![8]);
        assert_eq!(full.spectrum[0], (0..8).collect::<Vec<u8>>());
    }

    #[test]
    fn rgb_strata_aggregate() {
        let engine = Engine::new(2).expect("q2");
        let yellow = engine.triad([255u8, 255, 0]).expect("yellow");
        assert_eq!(yellow.stratum, vec![8, 8, 0]);
        assert_eq!(yellow.total_stratum, 16);
    }

    #[test]
    fn every_q0_triad_is_faithful() {
        let engine = Engine::q0();
        for datum in engine.domain() {
            let triad = Triad::of(datum);
            assert!(triad.is_faithful(), "unfaithful at {}", datum);
        }
    }

    #[test]
    fn tampered_triad_is_not_faithful() {
        let mut triad = Engine::q0().triad(5).expect("triad");
        triad.stratum[0] = 3;
        assert!(!triad.is_faithful());
    }

    #[test]
    fn serializes_camel_case() {
        let triad = Engine::q0().triad(1).expect("triad");
        let json = serde_json::to_value(&triad).expect("json");
        assert_eq!(json["totalStratum"], 1);
        assert_eq!(json["spectrum"][0][0], 0);
    }
}
