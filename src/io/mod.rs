//! # IO Module - Checkpoint Persistence
//!
//! This module provides persistence for simulation state. A checkpoint is a
//! plain ASCII text file: the first line records elapsed wall-clock time in
//! nanoseconds, and each following line records one occupied bucket as
//! `<size> <count> <collision_rate>`. Checkpoints are written as
//! `<simulation_time>.cpt` inside the configured output directory.
//!
//! The format deliberately stores masses and counts rather than bucket
//! indices: indices are ephemeral inside the engine, while a (mass, count)
//! listing can be replayed through the ordinary insertion operations on any
//! fresh ensemble, rebuilding the collision rates from scratch.

// Checkpoint reading and writing
pub mod checkpoint;

use std::fs;
use std::path::Path;

/// Ensures the checkpoint output directory exists
pub fn ensure_output_directory(dir: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(dir)
}
