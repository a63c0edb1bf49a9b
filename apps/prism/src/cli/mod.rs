//! # PRISM CLI Module
//!
//! This module implements the CLI interface for PRISM.
//!
//! ## Available Commands
//!
//! - `verify` - Run the law verifier
//! - `info` - Show the parameters of one or several quantum levels
//! - `triad` - Decompose a value into datum / stratum / spectrum
//! - `correlate` - Compare two values
//! - `derive` - Canonicalize and certify a term
//! - `emit` - Write a JSON-LD proof graph
//! - `match` - Map one labelled enumeration onto another

mod commands;

use crate::config::PrismConfig;
use clap::{Parser, Subcommand};
use prism_core::{Engine, PrismError, QuantumLevel};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// PRISM - finite algebraic engine
///
/// Every fixed-width byte tuple has a triadic coordinate; every computation
/// has a content-addressed certificate.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Quantum level (tuple width = level + 1 bytes)
    #[arg(short = 'Q', long, global = true)]
    pub quantum: Option<u8>,

    /// Path to a prism.toml configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify the algebraic laws at the selected level
    Verify,

    /// Show width, bits and cycle size
    Info {
        /// Show the bounded spaces Q0 through Q4
        #[arg(short, long)]
        all: bool,
    },

    /// Decompose a value (e.g. 42, 0x2A, 0b101010, 255,0,0)
    Triad {
        /// Value to decompose
        value: String,
    },

    /// Correlate two values
    Correlate {
        /// First value
        a: String,

        /// Second value
        b: String,
    },

    /// Canonicalize, evaluate and certify a term
    Derive {
        /// Operator (neg, bnot, succ, pred, xor, band, bor)
        operator: String,

        /// Operands
        #[arg(required = true, num_args = 1..)]
        operands: Vec<String>,

        /// Do not run the law verifier first
        #[arg(long)]
        skip_verify: bool,
    },

    /// Emit a JSON-LD proof graph
    Emit {
        /// Number of datums to sample (clamped to the cycle)
        #[arg(short = 'n', long)]
        sample_size: Option<u64>,

        /// Closure operations (not, neg, succ, pred), comma-separated
        #[arg(long, value_delimiter = ',')]
        closure: Option<Vec<String>>,

        /// Closure mode (one_step, fixed_point, graph_closed)
        #[arg(short, long)]
        mode: Option<String>,

        /// Term to derive and attach, e.g. "xor 0x55 0xAA" (repeatable)
        #[arg(short, long)]
        derive: Vec<String>,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not run the law verifier first
        #[arg(long)]
        skip_verify: bool,
    },

    /// Map labelled codes of one enumeration onto another by fidelity
    Match {
        /// Source entries as label=value (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        source: Vec<String>,

        /// Target entries as label=value (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        target: Vec<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), PrismError> {
    let config = PrismConfig::load(cli.config.as_deref())?;
    let level = match cli.quantum {
        Some(q) => QuantumLevel::new(q)?,
        None => config.quantum,
    };
    let engine = Engine::with_level(level);
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(quantum = %level, "engine ready");
    }

    match cli.command {
        Some(Commands::Verify) => cmd_verify(&engine, json_mode),
        Some(Commands::Info { all }) => cmd_info(&engine, all, json_mode),
        Some(Commands::Triad { value }) => cmd_triad(&engine, &value, json_mode),
        Some(Commands::Correlate { a, b }) => cmd_correlate(&engine, &a, &b, json_mode),
        Some(Commands::Derive {
            operator,
            operands,
            skip_verify,
        }) => cmd_derive(&engine, &operator, &operands, skip_verify, json_mode),
        Some(Commands::Emit {
            sample_size,
            closure,
            mode,
            derive,
            output,
            skip_verify,
        }) => {
            let request = EmitRequest::resolve(
                &config.emit,
                sample_size,
                closure.as_deref(),
                mode.as_deref(),
                &derive,
            )?;
            cmd_emit(&engine, &request, output.as_deref(), skip_verify, json_mode)
        }
        Some(Commands::Match { source, target }) => {
            cmd_match(&engine, &source, &target, json_mode)
        }
        None => {
            // No subcommand - show info by default
            cmd_info(&engine, false, json_mode)
        }
    }
}
