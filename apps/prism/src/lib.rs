//! # prism
//!
//! Command-line surface over `prism-core`.
//!
//! - `cli`: argument parsing and command implementations
//! - `config`: optional `prism.toml` defaults

pub mod cli;
pub mod config;
