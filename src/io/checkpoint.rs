//! Checkpoint reading and writing.

use crate::ensemble::Ensemble;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builds the checkpoint file path for a given simulated time.
///
/// Follows the `<simulation_time>.cpt` naming convention inside the output
/// directory.
pub fn checkpoint_path(output_dir: &Path, simulation_time: f64) -> PathBuf {
    output_dir.join(format!("{}.cpt", simulation_time))
}

/// Writes the ensemble's current distribution to a checkpoint file.
///
/// The output directory is created if it does not exist. Line one carries
/// the elapsed wall-clock time in nanoseconds; every further line is one
/// occupied bucket in ascending mass order.
///
/// # Arguments
///
/// * `ensemble` - Ensemble whose distribution is saved
/// * `output_dir` - Directory receiving the checkpoint file
/// * `simulation_time` - Simulated time stamped into the file name
/// * `elapsed` - Wall-clock time spent so far, recorded on line one
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written checkpoint
/// * `Err(Box<dyn std::error::Error>)` - Directory creation or write failure
pub fn save_checkpoint(
    ensemble: &Ensemble,
    output_dir: &Path,
    simulation_time: f64,
    elapsed: Duration,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    crate::io::ensure_output_directory(output_dir)?;

    let file_path = checkpoint_path(output_dir, simulation_time);
    let file = File::create(&file_path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", elapsed.as_nanos() as i64)?;
    for bucket in ensemble.distribution() {
        writeln!(
            writer,
            "{} {} {}",
            bucket.size, bucket.count, bucket.collision_rate
        )?;
    }
    writer.flush()?;

    Ok(file_path)
}

/// Restores a checkpoint into an ensemble.
///
/// Every bucket line is replayed through the ordinary insertion operations:
/// a monomer line becomes one batched `add_monomers` call, any other mass is
/// added particle by particle. The stored collision rates are ignored; the
/// replay rebuilds them incrementally, so a loaded ensemble satisfies the
/// same rate invariants as a freshly seeded one.
///
/// # Arguments
///
/// * `ensemble` - Ensemble to restore into; normally freshly constructed
/// * `path` - Checkpoint file to read
///
/// # Returns
///
/// * `Ok(Duration)` - The elapsed wall-clock time recorded on line one
/// * `Err(Box<dyn std::error::Error>)` - Missing file or malformed content
pub fn load_checkpoint(
    ensemble: &mut Ensemble,
    path: &Path,
) -> Result<Duration, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let elapsed_line = lines.next().ok_or("checkpoint file is empty")??;
    let elapsed_nanos: i64 = elapsed_line.trim().parse()?;

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let size: u64 = fields
            .next()
            .ok_or("bucket line is missing the size field")?
            .parse()?;
        let count: u64 = fields
            .next()
            .ok_or("bucket line is missing the count field")?
            .parse()?;
        // The stored rate is informational only; restoration recomputes it.
        let _stored_rate: f64 = fields
            .next()
            .ok_or("bucket line is missing the collision rate field")?
            .parse()?;

        if count == 0 {
            continue;
        }
        if size == 1 {
            ensemble.add_monomers(count);
        } else {
            ensemble.add_particle_repeated(size, count);
        }
    }

    Ok(Duration::from_nanos(elapsed_nanos.max(0) as u64))
}
