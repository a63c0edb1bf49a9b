//! # Datum Addressing
//!
//! Every datum has a stable IRI in the UOR namespace, one Braille glyph per
//! byte:
//!
//! ```text
//! https://uor.foundation/u/U28XX[U28XX...]
//! ```
//!
//! where `28XX` is the hex codepoint `0x2800 + byte`. The IRI depends only on
//! the datum, never on how it was computed, so it doubles as the graph node
//! key for emitted proofs.

use crate::Datum;
use crate::primitives::{BASE_IRI, BRAILLE_BASE};

/// Length of one `U28XX` segment.
pub const SEGMENT_LEN: usize = 5;

/// The Braille rendering of a datum, one character per byte.
#[must_use]
pub fn glyph(datum: Datum) -> String {
    datum
        .bytes()
        .iter()
        .filter_map(|&byte| char::from_u32(BRAILLE_BASE + u32::from(byte)))
        .collect()
}

/// The full IRI of a datum.
#[must_use]
pub fn datum_iri(datum: Datum) -> String {
    let mut iri = String::with_capacity(BASE_IRI.len() + SEGMENT_LEN * datum.width());
    iri.push_str(BASE_IRI);
    for &byte in datum.bytes() {
        iri.push_str(&format!("U{:04X}", BRAILLE_BASE + u32::from(byte)));
    }
    iri
}

/// Parse a datum back out of its IRI.
///
/// Returns `None` for foreign prefixes, malformed segments, or codepoints
/// outside the Braille block.
#[must_use]
pub fn parse_datum_iri(iri: &str) -> Option<Datum> {
    let suffix = iri.strip_prefix(BASE_IRI)?;
    if suffix.is_empty() || suffix.len() % SEGMENT_LEN != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(suffix.len() / SEGMENT_LEN);
    for segment in suffix.as_bytes().chunks(SEGMENT_LEN) {
        let (prefix, hex) = segment.split_first()?;
        if *prefix != b'U' {
            return None;
        }
        let hex = std::str::from_utf8(hex).ok()?;
        let codepoint = u32::from_str_radix(hex, 16).ok()?;
        let byte = codepoint.checked_sub(BRAILLE_BASE)?;
        bytes.push(u8::try_from(byte).ok()?);
    }
    Datum::from_bytes(&bytes).ok()
}
