//! # Law Verifier
//!
//! Certifies that an engine's operations satisfy the algebraic laws before
//! derivations and emissions are trusted.
//!
//! Verification is direct enumeration, not symbolic proof:
//! - Unary laws cover every state when `cycle <= EXHAUSTIVE_LIMIT`
//! - Binary laws cover every pair when `cycle <= PAIR_EXHAUSTIVE_LIMIT`
//! - Above those limits a deterministic sample stands in for the domain
//!
//! The first failing law aborts the run with `PrismError::Coherence`,
//! carrying the law and the input that broke it.

use crate::correlation::Correlation;
use crate::primitives::{
    EXHAUSTIVE_LIMIT, PAIR_EXHAUSTIVE_LIMIT, PAIR_SAMPLE_BUDGET, SAMPLE_BUDGET, SAMPLE_STRIDE,
};
use crate::quantum::QuantumLevel;
use crate::space::{Engine, Operator};
use crate::triad::{byte_spectrum, byte_stratum};
use crate::{Datum, PrismError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// LAWS
// =============================================================================

/// An algebraic law checked by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Law {
    /// `neg(neg(x)) == x`
    NegInvolution,
    /// `bnot(bnot(x)) == x`
    BnotInvolution,
    /// `neg(bnot(x)) == succ(x)`
    CriticalIdentitySucc,
    /// `bnot(neg(x)) == pred(x)`
    CriticalIdentityPred,
    /// `succ(pred(x)) == pred(succ(x)) == x`
    SuccPredInverse,
    /// `succ` from zero visits every state once and returns.
    CycleCompleteness,
    /// `xor(x, x) == 0`
    XorSelfCancellation,
    /// `xor(x, bnot(x)) == ones`
    XorComplement,
    /// `stratum(x)[i] + stratum(bnot(x))[i] == 8`
    StratumComplement,
    /// The spectrum rebuilds the datum and agrees with the stratum.
    SpectrumRecomposition,
    /// `correlate(x, x)` has zero difference.
    CorrelationIdentity,
    /// `correlate(x, bnot(x))` differs in every bit.
    ComplementExtremum,
    /// Unary results stay in the space.
    UnaryConfinement,
    /// Binary results stay in the space.
    BinaryConfinement,
}

impl Law {
    /// Every law, in check order.
    pub const ALL: [Self; 14] = [
        Self::UnaryConfinement,
        Self::NegInvolution,
        Self::BnotInvolution,
        Self::CriticalIdentitySucc,
        Self::CriticalIdentityPred,
        Self::SuccPredInverse,
        Self::XorSelfCancellation,
        Self::XorComplement,
        Self::StratumComplement,
        Self::SpectrumRecomposition,
        Self::CorrelationIdentity,
        Self::ComplementExtremum,
        Self::CycleCompleteness,
        Self::BinaryConfinement,
    ];

    /// Snake-case name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NegInvolution => "neg_involution",
            Self::BnotInvolution => "bnot_involution",
            Self::CriticalIdentitySucc => "critical_identity_succ",
            Self::CriticalIdentityPred => "critical_identity_pred",
            Self::SuccPredInverse => "succ_pred_inverse",
            Self::CycleCompleteness => "cycle_completeness",
            Self::XorSelfCancellation => "xor_self_cancellation",
            Self::XorComplement => "xor_complement",
            Self::StratumComplement => "stratum_complement",
            Self::SpectrumRecomposition => "spectrum_recomposition",
            Self::CorrelationIdentity => "correlation_identity",
            Self::ComplementExtremum => "complement_extremum",
            Self::UnaryConfinement => "unary_confinement",
            Self::BinaryConfinement => "binary_confinement",
        }
    }
}

impl fmt::Display for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// How much of the domain a verification run covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Every state and every pair.
    Exhaustive,
    /// Every state; binary laws over a sampled cross product.
    PairsSampled,
    /// Sampled states and sampled pairs.
    Sampled,
}

impl VerificationMode {
    /// Snake-case name as written into proof blocks.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::PairsSampled => "pairs_sampled",
            Self::Sampled => "sampled",
        }
    }

    /// The mode a verification run at `level` uses.
    #[must_use]
    pub fn for_level(level: QuantumLevel) -> Self {
        let cycle = level.cycle();
        if cycle <= u128::from(PAIR_EXHAUSTIVE_LIMIT) {
            Self::Exhaustive
        } else if cycle <= u128::from(EXHAUSTIVE_LIMIT) {
            Self::PairsSampled
        } else {
            Self::Sampled
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a successful verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Level verified.
    pub quantum: QuantumLevel,
    /// Laws checked, in order.
    pub laws: Vec<Law>,
    /// Individual law instances checked.
    pub checks: u64,
    /// Domain coverage.
    pub mode: VerificationMode,
}

// =============================================================================
// COVERAGE
// =============================================================================

/// The states one family of laws is checked over.
struct Coverage {
    level: QuantumLevel,
    exhaustive: bool,
    samples: Vec<Datum>,
}

impl Coverage {
    fn new(level: QuantumLevel, limit: u64, budget: u64) -> Self {
        if level.cycle() <= u128::from(limit) {
            Self {
                level,
                exhaustive: true,
                samples: Vec::new(),
            }
        } else {
            Self {
                level,
                exhaustive: false,
                samples: sample(level, budget),
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = Datum> + '_ {
        let level = self.level;
        let full = self
            .exhaustive
            .then(move || (0..=level.mask()).map(move |v| Datum::masked(v, level)));
        full.into_iter()
            .flatten()
            .chain(self.samples.iter().copied())
    }
}

/// Deterministic sample: boundary values plus an odd-stride walk.
fn sample(level: QuantumLevel, budget: u64) -> Vec<Datum> {
    let mask = level.mask();
    let half = mask >> 1;
    let boundaries = [0, 1, half, half + 1, mask - 1, mask];
    let walk = (0..budget).map(|i| i.wrapping_mul(SAMPLE_STRIDE) & mask);
    boundaries
        .into_iter()
        .chain(walk)
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .map(|v| Datum::masked(v, level))
        .collect()
}

/// Per byte: the spectrum rebuilds the byte and has `stratum` members.
fn recomposes(x: Datum) -> bool {
    x.bytes().iter().all(|&byte| {
        let (rebuilt, count) = byte_spectrum(byte)
            .fold((0u8, 0u8), |(acc, n), bit| (acc | (1 << bit), n + 1));
        rebuilt == byte && count == byte_stratum(byte)
    })
}

// =============================================================================
// CHECKER
// =============================================================================

#[derive(Default)]
struct Checker {
    checks: u64,
}

impl Checker {
    fn check(&mut self, law: Law, input: impl fmt::Display, holds: bool) -> Result<(), PrismError> {
        self.checks += 1;
        if holds {
            Ok(())
        } else {
            Err(PrismError::Coherence {
                law,
                input: input.to_string(),
            })
        }
    }

    fn unary_laws(&mut self, states: &Coverage) -> Result<(), PrismError> {
        let level = states.level;
        let zero = Datum::zero(level);
        let ones = Datum::ones(level);
        let bits = level.bits();

        for x in states.iter() {
            let neg = x.neg();
            let bnot = x.bnot();
            let succ = x.succ();
            let pred = x.pred();

            let confined = [neg, bnot, succ, pred]
                .iter()
                .all(|r| r.level() == level && r.value() <= level.mask());
            self.check(Law::UnaryConfinement, x, confined)?;
            self.check(Law::NegInvolution, x, neg.neg() == x)?;
            self.check(Law::BnotInvolution, x, bnot.bnot() == x)?;
            self.check(Law::CriticalIdentitySucc, x, bnot.neg() == succ)?;
            self.check(Law::CriticalIdentityPred, x, neg.bnot() == pred)?;
            self.check(Law::SuccPredInverse, x, pred.succ() == x && succ.pred() == x)?;
            self.check(Law::XorSelfCancellation, x, x.xor(x)? == zero)?;
            self.check(Law::XorComplement, x, x.xor(bnot)? == ones)?;

            let strata_sum_to_eight = x
                .bytes()
                .iter()
                .zip(bnot.bytes())
                .all(|(&a, &b)| u32::from(byte_stratum(a) + byte_stratum(b)) == u8::BITS);
            self.check(Law::StratumComplement, x, strata_sum_to_eight)?;
            self.check(Law::SpectrumRecomposition, x, recomposes(x))?;

            self.check(Law::CorrelationIdentity, x, Correlation::between(x, x)?.is_exact())?;
            let extremum = Correlation::between(x, bnot)?;
            self.check(Law::ComplementExtremum, x, extremum.total_difference == bits)?;
        }
        Ok(())
    }

    fn cycle_completeness(&mut self, states: &Coverage) -> Result<(), PrismError> {
        let level = states.level;
        let zero = Datum::zero(level);

        if states.exhaustive {
            let cycle = level.mask() as usize + 1;
            let mut seen = vec![0u64; cycle.div_ceil(64)];
            let mut current = zero;
            for _ in 0..cycle {
                let index = current.value() as usize;
                let (word, bit) = (index / 64, index % 64);
                let fresh = seen[word] & (1 << bit) == 0;
                self.check(Law::CycleCompleteness, current, fresh)?;
                seen[word] |= 1 << bit;
                current = current.succ();
            }
            return self.check(Law::CycleCompleteness, current, current == zero);
        }

        // succ is +1 below the top and wraps at it: one cycle through every state
        let ones = Datum::ones(level);
        for x in states.iter() {
            let steps_by_one = if x == ones {
                x.succ() == zero
            } else {
                x.succ().value() == x.value() + 1
            };
            self.check(Law::CycleCompleteness, x, steps_by_one)?;
        }
        Ok(())
    }

    fn binary_laws(&mut self, pairs: &Coverage) -> Result<(), PrismError> {
        let level = pairs.level;
        for x in pairs.iter() {
            for y in pairs.iter() {
                for op in [Operator::Xor, Operator::Band, Operator::Bor] {
                    let r = x.apply_binary(op, y)?;
                    let confined = r.level() == level && r.value() <= level.mask();
                    self.check(
                        Law::BinaryConfinement,
                        format_args!("{}({}, {})", op, x, y),
                        confined,
                    )?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// ENGINE SURFACE
// =============================================================================

impl Engine {
    /// Verify every law. `Ok(true)` on success, `Coherence` on the first failure.
    pub fn verify(&self) -> Result<bool, PrismError> {
        self.verify_report().map(|_| true)
    }

    /// Verify every law and report coverage.
    ///
    /// Caches the outcome on the engine; derivations and emissions read it.
    pub fn verify_report(&self) -> Result<VerificationReport, PrismError> {
        let level = self.level();
        let mode = VerificationMode::for_level(level);
        tracing::info!(quantum = %level, mode = %mode, "verifying laws");

        let states = Coverage::new(level, EXHAUSTIVE_LIMIT, SAMPLE_BUDGET);
        let pairs = Coverage::new(level, PAIR_EXHAUSTIVE_LIMIT, PAIR_SAMPLE_BUDGET);
        let mut checker = Checker::default();

        let outcome = checker
            .unary_laws(&states)
            .and_then(|()| checker.cycle_completeness(&states))
            .and_then(|()| checker.binary_laws(&pairs));

        match outcome {
            Ok(()) => {
                self.set_verified(true);
                tracing::info!(
                    quantum = %level,
                    laws = Law::ALL.len(),
                    checks = checker.checks,
                    "verification passed"
                );
                Ok(VerificationReport {
                    quantum: level,
                    laws: Law::ALL.to_vec(),
                    checks: checker.checks,
                    mode,
                })
            }
            Err(e) => {
                self.set_verified(false);
                tracing::warn!(quantum = %level, error = %e, "verification failed");
                Err(e)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
