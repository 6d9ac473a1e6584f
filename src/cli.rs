//! # CLI Module - Command Line Interface
//!
//! The binary takes a single positional argument: the path to a simulation
//! configuration document (TOML or JSON, see the config module for the
//! field set).
//!
//! **Usage**:
//! ```bash
//! smolsim-rs simulation.toml
//! ```
//!
//! Exit codes:
//! - `0` - the configured duration was integrated and checkpoints written
//! - `1` - the configuration was unreadable, named an unrecognized kernel
//!   or initial condition, or the run failed
//! - `2` - the configuration path argument was missing (clap usage error)

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a simulation configuration document (TOML or JSON)
    pub config: PathBuf,
}
