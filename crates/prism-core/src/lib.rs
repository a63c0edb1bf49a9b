//! # prism-core
//!
//! The finite algebraic engine for PRISM - THE LOGIC.
//!
//! Every fixed-width byte tuple gets a triadic coordinate (datum, stratum,
//! spectrum). A closed set of total operations acts on the tuples, and
//! computations are certified with canonicalized, content-addressed
//! derivation records that can be emitted as closed JSON-LD proof graphs.
//!
//! ## Components (leaves first)
//!
//! - `quantum`: quantum level, width, bit count, cycle size
//! - `types`: the `Datum` value type, operand conversion, `PrismError`
//! - `space`: the cyclic group operations and the `Engine`
//! - `triad`: datum / stratum / spectrum decomposition
//! - `correlation`: Hamming distance and fidelity
//! - `term` / `derivation`: canonicalization and certified evaluation
//! - `iri`: stable datum addressing
//! - `verify`: the law verifier
//! - `emit`: proof graph emission
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is pure and synchronous: NO async, NO network, NO file I/O
//! - Is deterministic: ordered collections wherever order reaches an output
//! - Is closed: the operator set is fixed
//! - Never panics on caller input; every failure is a `PrismError`
//!
//! ## Example
//!
//! ```
//! use prism_core::{ClosureMode, ClosureOp, Engine};
//!
//! let engine = Engine::q0();
//! assert!(engine.verify().unwrap());
//!
//! let a = engine.derive(&engine.make_term("xor", [0x55, 0xAA]).unwrap()).unwrap();
//! let b = engine.derive(&engine.make_term("xor", [0xAA, 0x55]).unwrap()).unwrap();
//! assert_eq!(a.derivation_id, b.derivation_id);
//!
//! let proof = engine.emit(256, &[ClosureOp::Not], ClosureMode::GraphClosed, &[a]).unwrap();
//! assert!(proof.proof.graph_fully_closed);
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod correlation;
pub mod derivation;
pub mod emit;
pub mod iri;
pub mod primitives;
pub mod quantum;
pub mod space;
pub mod term;
pub mod triad;
pub mod types;
pub mod verify;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use quantum::QuantumLevel;
pub use types::{Datum, Operand, PrismError};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use correlation::{Correlation, Correspondence, Match};
pub use derivation::{Derivation, derivation_id};
pub use emit::{
    ClosureMode, ClosureOp, Context, DatumNode, DerivationRecord, ProofBlock, ProofGraph,
};
pub use iri::{datum_iri, glyph, parse_datum_iri};
pub use space::{Engine, Operator};
pub use term::{CanonicalTerm, Canonicalization, Rewrite, RewriteStep, Term};
pub use triad::{Triad, spectrum_of, stratum_of};
pub use verify::{Law, VerificationMode, VerificationReport};
