//! # Proof Graph Emission
//!
//! Projects a sample of the space, plus any derivations, into a JSON-LD
//! document:
//!
//! ```text
//! {
//!   "@context": { ... },
//!   "proof":    { "verified", "datumCount", "graphFullyClosed", ... },
//!   "@graph":   [ { "@id", "@type": "Datum", "not": "<@id>", ... }, ... ]
//! }
//! ```
//!
//! Nodes are keyed by datum IRI and collected in ordered sets, so repeated
//! emissions with the same arguments are byte-identical. Closure is computed
//! once, here, by checking every edge target against the node set.
//!
//! Emission never mutates the engine.

use crate::derivation::Derivation;
use crate::iri::{datum_iri, glyph};
use crate::primitives::{BASE_IRI, DERIVATION_URN_PREFIX, MAX_EMIT_NODES, VOCAB_IRI};
use crate::quantum::QuantumLevel;
use crate::space::Engine;
use crate::term::RewriteStep;
use crate::triad::Triad;
use crate::verify::VerificationMode;
use crate::{Datum, PrismError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// `@type` of every emitted datum node.
pub const DATUM_NODE_TYPE: &str = "Datum";

// =============================================================================
// CLOSURE POLICY
// =============================================================================

/// How emitted edges must relate to the emitted node set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClosureMode {
    /// One edge per closure op; targets may fall outside the sample.
    #[default]
    OneStep,
    /// Grow the node set with edge targets until it is closed.
    FixedPoint,
    /// No growth; any dangling edge is a `ClosureViolation`.
    GraphClosed,
}

impl ClosureMode {
    /// Snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OneStep => "one_step",
            Self::FixedPoint => "fixed_point",
            Self::GraphClosed => "graph_closed",
        }
    }
}

impl FromStr for ClosureMode {
    type Err = PrismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "one_step" => Ok(Self::OneStep),
            "fixed_point" => Ok(Self::FixedPoint),
            "graph_closed" => Ok(Self::GraphClosed),
            _ => Err(PrismError::Domain(format!("unknown closure mode: {}", s))),
        }
    }
}

impl fmt::Display for ClosureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unary operation whose result becomes an edge on every datum node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureOp {
    /// Bitwise complement, emitted as `not`.
    #[serde(alias = "bnot")]
    Not,
    /// Additive inverse.
    Neg,
    /// Successor.
    Succ,
    /// Predecessor.
    Pred,
}

impl ClosureOp {
    /// Edge key in the emitted node.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Neg => "neg",
            Self::Succ => "succ",
            Self::Pred => "pred",
        }
    }

    /// The edge target of `datum`.
    #[must_use]
    pub fn apply(self, datum: Datum) -> Datum {
        match self {
            Self::Not => datum.bnot(),
            Self::Neg => datum.neg(),
            Self::Succ => datum.succ(),
            Self::Pred => datum.pred(),
        }
    }
}

impl FromStr for ClosureOp {
    type Err = PrismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not" | "bnot" => Ok(Self::Not),
            "neg" => Ok(Self::Neg),
            "succ" => Ok(Self::Succ),
            "pred" => Ok(Self::Pred),
            other => Err(PrismError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for ClosureOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// JSON-LD vocabulary block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    /// Default vocabulary.
    #[serde(rename = "@vocab")]
    pub vocab: &'static str,
    /// Prefix for datum IRIs.
    pub u: &'static str,
    /// Prefix for derivation ids.
    pub derivation: &'static str,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            vocab: VOCAB_IRI,
            u: BASE_IRI,
            derivation: DERIVATION_URN_PREFIX,
        }
    }
}

/// The `proof` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBlock {
    /// Whether the engine had passed verification at emission time.
    pub verified: bool,
    /// Coverage of that verification; `None` if unverified.
    pub verification_mode: Option<VerificationMode>,
    /// Number of `Datum` nodes.
    pub datum_count: usize,
    /// Every edge target is an emitted node.
    pub graph_fully_closed: bool,
    /// Edges whose target is not an emitted node.
    pub dangling_edges: usize,
    /// Closure policy used.
    pub closure_mode: ClosureMode,
    /// Closure operations, in canonical order.
    pub closure_ops: Vec<ClosureOp>,
    /// Engine level.
    pub quantum: QuantumLevel,
    /// Tuple width in bytes.
    pub width: usize,
    /// Total bit width.
    pub bits: u32,
    /// Number of states, in decimal (2^64 does not fit a JSON integer).
    pub cycle: String,
    /// Derivations attached to nodes.
    pub derivation_count: usize,
    /// BLAKE3 hex digest of the serialized `@graph`.
    pub graph_digest: String,
}

/// Provenance attached to the node a derivation evaluated to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationRecord {
    /// Content address of the canonical term.
    pub derivation_id: String,
    /// The term as written.
    pub term: String,
    /// The canonical term.
    pub canonical_term: String,
    /// Rewrites applied during canonicalization.
    pub rewrites: Vec<RewriteStep>,
    /// Whether the engine was verified at derivation time.
    pub verified: bool,
}

impl From<&Derivation> for DerivationRecord {
    fn from(d: &Derivation) -> Self {
        Self {
            derivation_id: d.derivation_id.clone(),
            term: d.original.to_string(),
            canonical_term: d.canonical.to_string(),
            rewrites: d.rewrites.clone(),
            verified: d.verified,
        }
    }
}

/// One `Datum` node of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatumNode {
    /// Datum IRI.
    #[serde(rename = "@id")]
    pub id: String,
    /// Always `Datum`.
    #[serde(rename = "@type")]
    pub kind: &'static str,
    /// Integer value (big-endian).
    pub value: u64,
    /// Level of the datum.
    pub quantum: QuantumLevel,
    /// Width in bytes.
    pub width: usize,
    /// Bit width.
    pub bits: u32,
    /// Byte tuple.
    pub bytes: Vec<u8>,
    /// Popcount per byte.
    pub stratum: Vec<u8>,
    /// Sum of `stratum`.
    pub total_stratum: u32,
    /// Set bit positions per byte.
    pub spectrum: Vec<Vec<u8>>,
    /// Braille rendering.
    pub glyph: String,
    /// Closure edges: op name to target `@id`.
    #[serde(flatten)]
    pub edges: BTreeMap<String, String>,
    /// Derivations that evaluated to this datum.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub derivations: Vec<DerivationRecord>,
}

impl DatumNode {
    fn new(datum: Datum, ops: &BTreeSet<ClosureOp>) -> Self {
        let triad = Triad::of(datum);
        Self {
            id: datum_iri(datum),
            kind: DATUM_NODE_TYPE,
            value: datum.value(),
            quantum: datum.level(),
            width: datum.width(),
            bits: datum.level().bits(),
            bytes: datum.bytes().to_vec(),
            stratum: triad.stratum,
            total_stratum: triad.total_stratum,
            spectrum: triad.spectrum,
            glyph: glyph(datum),
            edges: ops
                .iter()
                .map(|op| (op.name().to_string(), datum_iri(op.apply(datum))))
                .collect(),
            derivations: Vec::new(),
        }
    }
}

/// An emitted proof graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofGraph {
    /// Vocabulary.
    #[serde(rename = "@context")]
    pub context: Context,
    /// Verification and closure metadata.
    pub proof: ProofBlock,
    /// Datum nodes in ascending value order.
    #[serde(rename = "@graph")]
    pub graph: Vec<DatumNode>,
}

impl ProofGraph {
    /// Serialize to a JSON value.
    pub fn to_json_value(&self) -> Result<serde_json::Value, PrismError> {
        serde_json::to_value(self).map_err(|e| PrismError::Serialization(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, PrismError> {
        serde_json::to_string_pretty(self).map_err(|e| PrismError::Serialization(e.to_string()))
    }

    /// The `@id` of every datum node.
    #[must_use]
    pub fn datum_ids(&self) -> BTreeSet<&str> {
        self.graph.iter().map(|n| n.id.as_str()).collect()
    }

    /// Count edges whose target is not a node of this graph.
    #[must_use]
    pub fn dangling_edges(&self) -> usize {
        let ids = self.datum_ids();
        self.graph
            .iter()
            .flat_map(|n| n.edges.values())
            .filter(|target| !ids.contains(target.as_str()))
            .count()
    }

    /// Recompute the graph digest and compare it with the proof block.
    pub fn verify_digest(&self) -> Result<bool, PrismError> {
        Ok(graph_digest(&self.graph)? == self.proof.graph_digest)
    }
}

fn graph_digest(graph: &[DatumNode]) -> Result<String, PrismError> {
    let bytes = serde_json::to_vec(graph)
        .map_err(|e| PrismError::Serialization(format!("Graph digest: {}", e)))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// EMITTER
// =============================================================================

/// Evenly strided sample: `floor(i * cycle / n)` for `i in 0..n`.
fn strided_sample(level: QuantumLevel, n: u64) -> BTreeSet<Datum> {
    let cycle = level.cycle();
    (0..n)
        .map(|i| Datum::masked((u128::from(i) * cycle / u128::from(n)) as u64, level))
        .collect()
}

impl Engine {
    /// Emit a proof graph over `sample_size` datums.
    ///
    /// `sample_size` above the cycle is clamped to the full space. Derivation
    /// results join the node set; their provenance is attached to that node.
    pub fn emit(
        &self,
        sample_size: u64,
        closure_ops: &[ClosureOp],
        closure_mode: ClosureMode,
        derivations: &[Derivation],
    ) -> Result<ProofGraph, PrismError> {
        let level = self.level();
        let n = if u128::from(sample_size) >= self.cycle() {
            self.cycle()
        } else {
            u128::from(sample_size)
        };
        if n > u128::from(MAX_EMIT_NODES) {
            return Err(PrismError::Domain(format!(
                "sample of {} datums exceeds emission limit {}",
                n, MAX_EMIT_NODES
            )));
        }

        if let Some(foreign) = derivations
            .iter()
            .find(|d| d.result_datum.level() != level)
        {
            return Err(PrismError::Domain(format!(
                "derivation {} is not at {}",
                foreign.derivation_id, level
            )));
        }

        let ops: BTreeSet<ClosureOp> = closure_ops.iter().copied().collect();
        let mut datums = strided_sample(level, n as u64);
        datums.extend(derivations.iter().map(|d| d.result_datum));
        if datums.len() as u64 > MAX_EMIT_NODES {
            return Err(PrismError::Domain(format!(
                "{} datums with derivation results exceed emission limit {}",
                datums.len(),
                MAX_EMIT_NODES
            )));
        }

        if closure_mode == ClosureMode::FixedPoint {
            let mut frontier: Vec<Datum> = datums.iter().copied().collect();
            while let Some(x) = frontier.pop() {
                for op in &ops {
                    let y = op.apply(x);
                    if datums.insert(y) {
                        if datums.len() as u64 > MAX_EMIT_NODES {
                            return Err(PrismError::Domain(format!(
                                "fixed-point closure exceeds emission limit {}",
                                MAX_EMIT_NODES
                            )));
                        }
                        frontier.push(y);
                    }
                }
            }
        }

        let dangling = datums
            .iter()
            .flat_map(|&x| ops.iter().map(move |op| op.apply(x)))
            .filter(|target| !datums.contains(target))
            .count();
        match closure_mode {
            ClosureMode::GraphClosed if dangling > 0 => {
                return Err(PrismError::ClosureViolation { dangling });
            }
            ClosureMode::OneStep if dangling > 0 => {
                tracing::warn!(dangling, "emitted graph has dangling edges");
            }
            _ => {}
        }

        let mut records: BTreeMap<Datum, BTreeSet<DerivationRecord>> = BTreeMap::new();
        for d in derivations {
            records
                .entry(d.result_datum)
                .or_default()
                .insert(DerivationRecord::from(d));
        }
        let derivation_count = records.values().map(BTreeSet::len).sum();

        let graph: Vec<DatumNode> = datums
            .iter()
            .map(|&x| {
                let mut node = DatumNode::new(x, &ops);
                if let Some(attached) = records.remove(&x) {
                    node.derivations = attached.into_iter().collect();
                }
                node
            })
            .collect();

        let verified = self.is_verified();
        if !verified {
            tracing::warn!(quantum = %level, "emitting from an unverified engine");
        }

        let proof = ProofBlock {
            verified,
            verification_mode: verified.then(|| VerificationMode::for_level(level)),
            datum_count: graph.len(),
            graph_fully_closed: dangling == 0,
            dangling_edges: dangling,
            closure_mode,
            closure_ops: ops.into_iter().collect(),
            quantum: level,
            width: self.width(),
            bits: self.bits(),
            cycle: self.cycle().to_string(),
            derivation_count,
            graph_digest: graph_digest(&graph)?,
        };

        tracing::debug!(
            quantum = %level,
            datums = proof.datum_count,
            closed = proof.graph_fully_closed,
            "emitted proof graph"
        );

        Ok(ProofGraph {
            context: Context::default(),
            proof,
            graph,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
