//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::EmitConfig;
use prism_core::{
    ClosureMode, ClosureOp, Datum, Derivation, Engine, Operand, PrismError, QuantumLevel, Term,
    datum_iri, glyph, primitives::MAX_QUANTUM_LEVEL,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Highest level listed by `info --all`; beyond it spaces are not enumerable.
const INFO_MAX_LEVEL: u8 = 4;

// =============================================================================
// INPUT PARSING
// =============================================================================

/// Parse a value written on the command line.
///
/// Accepts decimal (`42`), hex (`0x2A`), binary (`0b101010`) and byte tuples
/// (`255,0,0`). Tuple components above 255 are rejected here; range checks
/// against the engine width happen when the operand is resolved.
pub fn parse_operand(raw: &str) -> Result<Operand, PrismError> {
    let raw = raw.trim();
    if raw.contains(',') {
        let bytes = raw
            .split(',')
            .map(parse_byte)
            .collect::<Result<Vec<u8>, _>>()?;
        return Ok(Operand::Bytes(bytes));
    }
    parse_integer(raw).map(Operand::Int)
}

fn parse_integer(raw: &str) -> Result<i128, PrismError> {
    let (digits, radix) = if let Some(hex) = raw.strip_prefix("0x").or(raw.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = raw.strip_prefix("0b").or(raw.strip_prefix("0B")) {
        (bin, 2)
    } else {
        (raw, 10)
    };
    i128::from_str_radix(digits, radix)
        .map_err(|e| PrismError::Domain(format!("Invalid value '{}': {}", raw, e)))
}

fn parse_byte(raw: &str) -> Result<u8, PrismError> {
    let value = parse_integer(raw.trim())?;
    u8::try_from(value).map_err(|_| {
        PrismError::Domain(format!("Tuple component {} outside 0..=255", value))
    })
}

/// Parse a `label=value` enumeration entry.
pub fn parse_labelled(entry: &str) -> Result<(String, Operand), PrismError> {
    let (label, value) = entry.split_once('=').ok_or_else(|| {
        PrismError::Domain(format!("Expected label=value, got '{}'", entry))
    })?;
    Ok((label.trim().to_string(), parse_operand(value)?))
}

/// A term written as `operator operand...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSpec {
    /// Operator name.
    pub operator: String,
    /// Operands, unresolved.
    pub operands: Vec<Operand>,
}

impl TermSpec {
    /// Parse `"xor 0x55 0xAA"`.
    pub fn parse(spec: &str) -> Result<Self, PrismError> {
        let mut parts = spec.split_whitespace();
        let operator = parts
            .next()
            .ok_or_else(|| PrismError::Domain("Empty term".to_string()))?
            .to_string();
        let operands = parts.map(parse_operand).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { operator, operands })
    }

    /// Build the term at `engine`'s width.
    pub fn build(&self, engine: &Engine) -> Result<Term, PrismError> {
        engine.make_term(&self.operator, self.operands.iter().cloned())
    }

    /// Build and derive the term on `engine`.
    pub fn derive(&self, engine: &Engine) -> Result<Derivation, PrismError> {
        engine.derive(&self.build(engine)?)
    }
}

/// Emission parameters after merging flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitRequest {
    /// Number of datums to sample.
    pub sample_size: u64,
    /// Closure operations.
    pub closure_ops: Vec<ClosureOp>,
    /// Closure policy.
    pub mode: ClosureMode,
    /// Terms to derive and attach.
    pub terms: Vec<TermSpec>,
}

impl EmitRequest {
    /// Merge command-line values over config defaults.
    pub fn resolve(
        defaults: &EmitConfig,
        sample_size: Option<u64>,
        closure: Option<&[String]>,
        mode: Option<&str>,
        derive: &[String],
    ) -> Result<Self, PrismError> {
        let closure_ops = match closure {
            Some(names) => names
                .iter()
                .filter(|name| !name.trim().is_empty())
                .map(|name| name.trim().parse())
                .collect::<Result<Vec<ClosureOp>, _>>()?,
            None => defaults.closure_ops.clone(),
        };
        let mode = match mode {
            Some(name) => name.parse()?,
            None => defaults.closure_mode,
        };
        Ok(Self {
            sample_size: sample_size.unwrap_or(defaults.sample_size),
            closure_ops,
            mode,
            terms: derive
                .iter()
                .map(|spec| TermSpec::parse(spec))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json(value: &impl Serialize) -> Result<(), PrismError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PrismError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Validate output path.
///
/// For output files, we validate the parent directory exists and is a
/// directory, and return the path under its canonical parent.
pub fn validate_output_path(path: &Path) -> Result<PathBuf, PrismError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PrismError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PrismError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PrismError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Run the law verifier.
pub fn cmd_verify(engine: &Engine, json_mode: bool) -> Result<(), PrismError> {
    let report = engine.verify_report()?;

    if json_mode {
        let output = serde_json::json!({
            "verified": true,
            "quantum": report.quantum,
            "mode": report.mode,
            "laws": report.laws,
            "checks": report.checks
        });
        return print_json(&output);
    }

    println!("PRISM Law Verification");
    println!("======================");
    println!("Quantum: {}", report.quantum);
    println!("Mode:    {}", report.mode);
    println!("Checks:  {}", report.checks);
    println!();
    for law in &report.laws {
        println!("  ✓ {}", law);
    }
    println!();
    println!("All {} laws hold.", report.laws.len());

    Ok(())
}

// =============================================================================
// INFO COMMAND
// =============================================================================

#[derive(Serialize)]
struct LevelInfo {
    quantum: QuantumLevel,
    width: usize,
    bits: u32,
    cycle: String,
}

impl From<QuantumLevel> for LevelInfo {
    fn from(level: QuantumLevel) -> Self {
        Self {
            quantum: level,
            width: level.width(),
            bits: level.bits(),
            cycle: level.cycle().to_string(),
        }
    }
}

/// Show quantum level parameters.
pub fn cmd_info(engine: &Engine, all: bool, json_mode: bool) -> Result<(), PrismError> {
    let levels = if all {
        (0..=INFO_MAX_LEVEL.min(MAX_QUANTUM_LEVEL))
            .map(QuantumLevel::new)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![engine.level()]
    };
    let infos: Vec<LevelInfo> = levels.into_iter().map(LevelInfo::from).collect();

    if json_mode {
        return print_json(&infos);
    }

    println!("PRISM Bounded Spaces");
    println!("====================");
    for info in &infos {
        println!(
            "  {}: {} byte(s), {} bits, {} states",
            info.quantum, info.width, info.bits, info.cycle
        );
    }

    Ok(())
}

// =============================================================================
// TRIAD COMMAND
// =============================================================================

/// Decompose a value into its triadic coordinate.
pub fn cmd_triad(engine: &Engine, value: &str, json_mode: bool) -> Result<(), PrismError> {
    let triad = engine.triad(parse_operand(value)?)?;

    if json_mode {
        let output = serde_json::json!({
            "@id": datum_iri(triad.datum),
            "glyph": glyph(triad.datum),
            "triad": triad
        });
        return print_json(&output);
    }

    println!("Datum:    {} {}", triad.datum, glyph(triad.datum));
    println!("IRI:      {}", datum_iri(triad.datum));
    println!("Stratum:  {:?} (total {})", triad.stratum, triad.total_stratum);
    println!("Spectrum: {:?}", triad.spectrum);

    Ok(())
}

// =============================================================================
// CORRELATE COMMAND
// =============================================================================

/// Correlate two values.
pub fn cmd_correlate(engine: &Engine, a: &str, b: &str, json_mode: bool) -> Result<(), PrismError> {
    let correlation = engine.correlate(parse_operand(a)?, parse_operand(b)?)?;

    if json_mode {
        return print_json(&correlation);
    }

    println!("Fidelity:        {}", correlation.fidelity);
    println!("Total difference: {}", correlation.total_difference);
    println!("Max difference:   {}", correlation.max_difference);

    Ok(())
}

// =============================================================================
// DERIVE COMMAND
// =============================================================================

/// Canonicalize, evaluate and certify a term.
pub fn cmd_derive(
    engine: &Engine,
    operator: &str,
    operands: &[String],
    skip_verify: bool,
    json_mode: bool,
) -> Result<(), PrismError> {
    let spec = TermSpec {
        operator: operator.to_string(),
        operands: operands
            .iter()
            .map(|o| parse_operand(o))
            .collect::<Result<Vec<_>, _>>()?,
    };
    let term = spec.build(engine)?;
    if !skip_verify {
        engine.verify()?;
    }
    let derivation = engine.derive(&term)?;

    if json_mode {
        return print_json(&derivation);
    }

    println!("Term:       {}", derivation.original);
    println!("Canonical:  {}", derivation.canonical);
    for step in &derivation.rewrites {
        println!("  {:?}: {} -> {} operand(s)", step.rule, step.before, step.after);
    }
    println!("Result:     {}", derivation.result_datum);
    println!("IRI:        {}", derivation.result_iri);
    println!("Derivation: {}", derivation.derivation_id);
    println!("Verified:   {}", derivation.verified);

    Ok(())
}

// =============================================================================
// EMIT COMMAND
// =============================================================================

/// Emit a JSON-LD proof graph to a file or stdout.
pub fn cmd_emit(
    engine: &Engine,
    request: &EmitRequest,
    output: Option<&Path>,
    skip_verify: bool,
    json_mode: bool,
) -> Result<(), PrismError> {
    let terms = request
        .terms
        .iter()
        .map(|spec| spec.build(engine))
        .collect::<Result<Vec<_>, _>>()?;
    if !skip_verify {
        engine.verify()?;
    }
    let derivations = terms
        .iter()
        .map(|term| engine.derive(term))
        .collect::<Result<Vec<_>, _>>()?;

    let graph = engine.emit(
        request.sample_size,
        &request.closure_ops,
        request.mode,
        &derivations,
    )?;
    let document = graph.to_json_string()?;

    let Some(output) = output else {
        println!("{}", document);
        return Ok(());
    };

    let validated_output = validate_output_path(output)?;
    std::fs::write(&validated_output, document.as_bytes())
        .map_err(|e| PrismError::Io(format!("Write file: {}", e)))?;

    if json_mode {
        let summary = serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "bytes": document.len(),
            "proof": graph.proof
        });
        return print_json(&summary);
    }

    println!("Emitted {} bytes to {:?}", document.len(), validated_output);
    println!("  Datums:       {}", graph.proof.datum_count);
    println!("  Verified:     {}", graph.proof.verified);
    println!("  Fully closed: {}", graph.proof.graph_fully_closed);
    println!("  Digest:       {}", graph.proof.graph_digest);

    Ok(())
}

// =============================================================================
// MATCH COMMAND
// =============================================================================

fn resolve_enumeration(
    engine: &Engine,
    entries: &[String],
) -> Result<Vec<(String, Datum)>, PrismError> {
    entries
        .iter()
        .map(|entry| {
            let (label, operand) = parse_labelled(entry)?;
            Ok((label, engine.datum(operand)?))
        })
        .collect()
}

/// Map each source code onto its best target by fidelity.
pub fn cmd_match(
    engine: &Engine,
    source: &[String],
    target: &[String],
    json_mode: bool,
) -> Result<(), PrismError> {
    let source = resolve_enumeration(engine, source)?;
    let target = resolve_enumeration(engine, target)?;
    let rows = engine.match_enumerations(&source, &target)?;

    if json_mode {
        return print_json(&rows);
    }

    println!("PRISM Correspondence");
    println!("====================");
    for row in &rows {
        let marker = if row.correlation.is_exact() { "=" } else { "~" };
        println!(
            "  {} {} {}  (fidelity {})",
            row.source, marker, row.target, row.correlation.fidelity
        );
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_formats() {
        assert_eq!(parse_operand("42").expect("dec"), Operand::Int(42));
        assert_eq!(parse_operand("0x2A").expect("hex"), Operand::Int(42));
        assert_eq!(parse_operand("0b101010").expect("bin"), Operand::Int(42));
        assert_eq!(
            parse_operand("255, 0, 0").expect("tuple"),
            Operand::Bytes(vec![255, 0, 0])
        );
        assert_eq!(parse_operand("-1").expect("neg"), Operand::Int(-1));
    }

    #[test]
    fn tuple_components_bounded() {
        assert!(matches!(
            parse_operand("256,0"),
            Err(PrismError::Domain(_))
        ));
        assert!(parse_operand("zz").is_err());
    }

    #[test]
    fn labelled_entries() {
        let (label, operand) = parse_labelled("active=0x01").expect("entry");
        assert_eq!(label, "active");
        assert_eq!(operand, Operand::Int(1));
        assert!(parse_labelled("active").is_err());
    }

    #[test]
    fn term_spec() {
        let spec = TermSpec::parse("xor 0x55 0xAA").expect("spec");
        assert_eq!(spec.operator, "xor");
        assert_eq!(spec.operands.len(), 2);
        let d = spec.derive(&Engine::q0()).expect("derive");
        assert_eq!(d.result_datum.value(), 0xFF);
        assert!(TermSpec::parse("   ").is_err());
    }

    #[test]
    fn emit_request_overrides_config() {
        let defaults = EmitConfig::default();
        let request = EmitRequest::resolve(
            &defaults,
            Some(16),
            Some(&["succ".to_string(), "pred".to_string()]),
            Some("fixed_point"),
            &["neg 1".to_string()],
        )
        .expect("request");
        assert_eq!(request.sample_size, 16);
        assert_eq!(request.closure_ops, vec![ClosureOp::Succ, ClosureOp::Pred]);
        assert_eq!(request.mode, ClosureMode::FixedPoint);
        assert_eq!(request.terms.len(), 1);

        let fallback = EmitRequest::resolve(&defaults, None, None, None, &[]).expect("defaults");
        assert_eq!(fallback.sample_size, defaults.sample_size);
        assert_eq!(fallback.closure_ops, defaults.closure_ops);
    }

    #[test]
    fn unknown_closure_op_rejected() {
        let result = EmitRequest::resolve(
            &EmitConfig::default(),
            None,
            Some(&["rotate".to_string()]),
            None,
            &[],
        );
        assert!(matches!(result, Err(PrismError::UnknownOperator(_))));
    }

    #[test]
    fn bad_terms_rejected_before_verification() {
        let engine = Engine::q0();
        let operands = ["1".to_string(), "0x100".to_string()];
        assert!(matches!(
            cmd_derive(&engine, "xor", &operands, false, true),
            Err(PrismError::Domain(_))
        ));
        assert!(matches!(
            cmd_derive(&engine, "nand", &operands[..1], false, true),
            Err(PrismError::UnknownOperator(_))
        ));

        let request = EmitRequest::resolve(
            &EmitConfig::default(),
            Some(4),
            None,
            None,
            &["neg 300".to_string()],
        )
        .expect("request");
        assert!(cmd_emit(&engine, &request, None, false, true).is_err());
        assert!(!engine.is_verified());
    }

    #[test]
    fn output_path_needs_existing_parent() {
        assert!(validate_output_path(Path::new("/nonexistent/dir/out.json")).is_err());
        assert!(validate_output_path(Path::new("out.json")).is_ok());
    }
}
