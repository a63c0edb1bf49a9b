//! # Derivations
//!
//! A derivation is a certified evaluation of a canonical term:
//!
//! ```text
//! Term ──canonicalize──▶ CanonicalTerm ──evaluate──▶ result_datum
//!                             │
//!                             └──postcard──▶ BLAKE3 ──▶ derivation_id
//! ```
//!
//! The id depends on the canonical term alone. Two terms that reduce to the
//! same canonical form share an id and a result, however they were written.

use crate::iri::datum_iri;
use crate::primitives::DERIVATION_URN_PREFIX;
use crate::space::Engine;
use crate::term::{CanonicalTerm, RewriteStep, Term};
use crate::{Datum, PrismError};
use serde::Serialize;

/// The certified evaluation of one term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Derivation {
    /// The term as the caller wrote it.
    pub original: Term,
    /// Its canonical representative.
    pub canonical: CanonicalTerm,
    /// The evaluated value.
    pub result_datum: Datum,
    /// Content address of the canonical term.
    pub derivation_id: String,
    /// IRI of `result_datum`; independent of the derivation.
    pub result_iri: String,
    /// Rewrites applied on the way to the canonical form.
    pub rewrites: Vec<RewriteStep>,
    /// Whether the engine had passed verification when this was derived.
    pub verified: bool,
}

impl Derivation {
    /// Recompute the id from the canonical term and compare.
    pub fn verify_id(&self) -> Result<bool, PrismError> {
        Ok(derivation_id(&self.canonical)? == self.derivation_id)
    }
}

/// Content address of a canonical term.
pub fn derivation_id(canonical: &CanonicalTerm) -> Result<String, PrismError> {
    let encoded = canonical.encode()?;
    Ok(format!(
        "{}{}",
        DERIVATION_URN_PREFIX,
        blake3::hash(&encoded).to_hex()
    ))
}

impl Engine {
    /// Canonicalize, evaluate and certify a term.
    ///
    /// The term must match this engine's width.
    pub fn derive(&self, term: &Term) -> Result<Derivation, PrismError> {
        if term.level() != self.level() {
            return Err(PrismError::Domain(format!(
                "term {} is at {}, engine is {}",
                term,
                term.level(),
                self.level()
            )));
        }

        let canonicalization = term.canonicalize();
        let canonical = canonicalization.term;
        let result_datum = canonical.evaluate()?;
        let derivation_id = derivation_id(&canonical)?;

        tracing::debug!(
            term = %term,
            canonical = %canonical,
            result = %result_datum,
            id = %derivation_id,
            "derived"
        );

        Ok(Derivation {
            original: term.clone(),
            canonical,
            result_datum,
            result_iri: datum_iri(result_datum),
            derivation_id,
            rewrites: canonicalization.steps,
            verified: self.is_verified(),
        })
    }
}
