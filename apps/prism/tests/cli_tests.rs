//! Integration tests for the PRISM command-line binary.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use prism::cli::{Cli, Commands, parse_operand};
use prism::config::PrismConfig;
use prism_core::{ClosureMode, ClosureOp, Operand, QuantumLevel};
use std::process::{Command, Output};

fn prism(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prism"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn test_parse_global_flags() {
    let cli = Cli::try_parse_from(["prism", "--quantum", "2", "--json-mode", "verify"]).unwrap();
    assert_eq!(cli.quantum, Some(2));
    assert!(cli.json_mode);
    assert!(matches!(cli.command, Some(Commands::Verify)));
}

#[test]
fn test_parse_emit_flags() {
    let cli = Cli::try_parse_from([
        "prism", "emit", "-n", "16", "--closure", "not,succ", "--mode", "graph_closed", "-d",
        "xor 1 2", "-d", "neg 3",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Emit {
            sample_size,
            closure,
            mode,
            derive,
            ..
        }) => {
            assert_eq!(sample_size, Some(16));
            assert_eq!(closure, Some(vec!["not".to_string(), "succ".to_string()]));
            assert_eq!(mode.as_deref(), Some("graph_closed"));
            assert_eq!(derive.len(), 2);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_derive_requires_operands() {
    assert!(Cli::try_parse_from(["prism", "derive", "xor"]).is_err());
}

#[test]
fn test_parse_operand_tuple() {
    assert_eq!(
        parse_operand("255,255,0").unwrap(),
        Operand::Bytes(vec![255, 255, 0])
    );
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_config_file_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prism.toml");
    std::fs::write(
        &path,
        "quantum = 1\n[emit]\nsample_size = 8\nclosure_ops = [\"neg\"]\nclosure_mode = \"one_step\"\n",
    )
    .unwrap();

    let config = PrismConfig::load(Some(&path)).unwrap();
    assert_eq!(config.quantum, QuantumLevel::Q1);
    assert_eq!(config.emit.sample_size, 8);
    assert_eq!(config.emit.closure_ops, vec![ClosureOp::Neg]);
    assert_eq!(config.emit.closure_mode, ClosureMode::OneStep);
}

#[test]
fn test_config_quantum_used_by_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "quantum = 1\n").unwrap();

    let output = prism(&["-q", "--json-mode", "-c", path.to_str().unwrap(), "info"]);
    let json = stdout_json(&output);
    assert_eq!(json[0]["quantum"], 1);
    assert_eq!(json[0]["cycle"], "65536");
}

#[test]
fn test_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "quantum = 1\n").unwrap();

    let output = prism(&["-q", "--json-mode", "-c", path.to_str().unwrap(), "-Q", "0", "info"]);
    assert_eq!(stdout_json(&output)[0]["quantum"], 0);
}

#[test]
fn test_missing_config_fails() {
    let output = prism(&["-q", "-c", "/nonexistent/prism.toml", "info"]);
    assert!(!output.status.success());
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn test_verify_command() {
    let json = stdout_json(&prism(&["-q", "--json-mode", "verify"]));
    assert_eq!(json["verified"], true);
    assert_eq!(json["mode"], "exhaustive");
}

#[test]
fn test_info_all_lists_bounded_spaces() {
    let json = stdout_json(&prism(&["-q", "--json-mode", "info", "--all"]));
    let levels = json.as_array().unwrap();
    assert_eq!(levels.len(), 5);
    assert_eq!(levels[4]["width"], 5);
}

#[test]
fn test_triad_command() {
    let json = stdout_json(&prism(&["-q", "--json-mode", "triad", "42"]));
    assert_eq!(json["triad"]["stratum"][0], 3);
    assert_eq!(json["@id"], "https://uor.foundation/u/U282A");
}

#[test]
fn test_correlate_command() {
    let json = stdout_json(&prism(&["-q", "--json-mode", "correlate", "0x00", "0xFF"]));
    assert_eq!(json["totalDifference"], 8);
    assert_eq!(json["fidelity"], 0.0);
}

#[test]
fn test_derive_command_is_order_independent() {
    let a = stdout_json(&prism(&["-q", "--json-mode", "derive", "xor", "0x55", "0xAA"]));
    let b = stdout_json(&prism(&["-q", "--json-mode", "derive", "xor", "0xAA", "0x55"]));
    assert_eq!(a["derivation_id"], b["derivation_id"]);
    assert_eq!(a["verified"], true);
}

#[test]
fn test_unknown_operator_fails() {
    let output = prism(&["-q", "derive", "nand", "1", "2"]);
    assert!(!output.status.success());
}

#[test]
fn test_emit_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proof.jsonld");

    let output = prism(&[
        "-q",
        "emit",
        "-n",
        "256",
        "--closure",
        "not",
        "--mode",
        "graph_closed",
        "-d",
        "xor 0x55 0xAA",
        "-o",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["proof"]["verified"], true);
    assert_eq!(doc["proof"]["datumCount"], 256);
    assert_eq!(doc["proof"]["graphFullyClosed"], true);
    let with_derivation = doc["@graph"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n.get("derivations").is_some())
        .count();
    assert_eq!(with_derivation, 1);
}

#[test]
fn test_emit_to_stdout() {
    let doc = stdout_json(&prism(&["-q", "emit", "-n", "4", "--closure", "neg"]));
    assert_eq!(doc["proof"]["datumCount"], 4);
    assert!(doc.get("@context").is_some());
}

#[test]
fn test_emit_graph_closed_violation_fails() {
    let output = prism(&["-q", "emit", "-n", "10", "--closure", "succ", "--mode", "graph_closed"]);
    assert!(!output.status.success());
}

#[test]
fn test_match_command() {
    let json = stdout_json(&prism(&[
        "-q",
        "--json-mode",
        "-Q",
        "3",
        "match",
        "-s",
        "active=0x01",
        "-s",
        "deleted=0x08",
        "-t",
        "enabled=0x01",
        "-t",
        "removed=0x08",
    ]));
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source"], "active");
    assert_eq!(rows[0]["target"], "enabled");
    assert_eq!(rows[1]["target"], "removed");
}
