//! # Innate Primitives
//!
//! Hardcoded constants for the PRISM engine.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Every bound that keeps verification and emission finite lives here.

// =============================================================================
// QUANTUM LEVELS
// =============================================================================

/// Highest supported quantum level.
///
/// Level `q` selects a tuple width of `q + 1` bytes, so the maximum width is
/// 8 bytes and every datum fits a `u64`.
pub const MAX_QUANTUM_LEVEL: u8 = 7;

/// Maximum datum width in bytes (`MAX_QUANTUM_LEVEL + 1`).
pub const MAX_WIDTH: usize = MAX_QUANTUM_LEVEL as usize + 1;

/// Bits per byte position.
pub const BYTE_BITS: u32 = 8;

// =============================================================================
// ADDRESSING
// =============================================================================

/// Default vocabulary of emitted proof graphs.
pub const VOCAB_IRI: &str = "https://uor.foundation/";

/// Base IRI for datum nodes. Each byte appends a `U28XX` glyph segment.
pub const BASE_IRI: &str = "https://uor.foundation/u/";

/// First codepoint of the Unicode Braille Patterns block.
pub const BRAILLE_BASE: u32 = 0x2800;

/// URN prefix for content-addressed derivation identifiers.
pub const DERIVATION_URN_PREFIX: &str = "urn:uor:derivation:blake3:";

// =============================================================================
// VERIFICATION BOUNDS
// =============================================================================

/// Largest cycle for which unary laws are checked over every state.
///
/// Covers quantum levels 0..=2. Beyond this the verifier samples.
pub const EXHAUSTIVE_LIMIT: u64 = 1 << 24;

/// Largest cycle for which binary laws are checked over every pair.
///
/// At width 1 this is 65 536 pairs per operation.
pub const PAIR_EXHAUSTIVE_LIMIT: u64 = 1 << 8;

/// Number of sampled states used when a level exceeds `EXHAUSTIVE_LIMIT`.
pub const SAMPLE_BUDGET: u64 = 1 << 16;

/// Number of sampled states per side of the binary cross product when a
/// level exceeds `PAIR_EXHAUSTIVE_LIMIT`.
pub const PAIR_SAMPLE_BUDGET: u64 = 1 << 8;

/// Odd multiplier for the sampling walk (golden ratio, 64-bit).
///
/// Multiplication by an odd constant is a bijection modulo any power of
/// two, so the first `n` walk positions are distinct.
pub const SAMPLE_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum number of operands accepted by an n-ary term.
pub const MAX_TERM_OPERANDS: usize = 1024;

/// Maximum number of `Datum` nodes in a single emitted proof graph.
///
/// Bounds `FixedPoint` expansion as well as direct sampling.
pub const MAX_EMIT_NODES: u64 = 1 << 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_matches_level() {
        assert_eq!(MAX_WIDTH, 8);
        assert!(MAX_WIDTH * BYTE_BITS as usize <= u64::BITS as usize);
    }

    #[test]
    fn sample_stride_is_odd() {
        assert_eq!(SAMPLE_STRIDE % 2, 1);
    }

    #[test]
    fn limits_are_ordered() {
        assert!(PAIR_EXHAUSTIVE_LIMIT <= EXHAUSTIVE_LIMIT);
        assert!(SAMPLE_BUDGET <= EXHAUSTIVE_LIMIT);
        assert!(MAX_EMIT_NODES <= EXHAUSTIVE_LIMIT);
    }
}
