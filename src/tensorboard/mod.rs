//! Scalar instrumentation for training runs.
//!
//! The agent reports through [`ScalarSink`] and never depends on a concrete
//! backend. [`TensorboardWriter`] logs to a CSV file that plotting tools or a
//! TensorBoard converter can read; [`NullSink`] drops everything.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Destination for scalar metrics keyed by a global step.
pub trait ScalarSink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that discards every scalar.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ScalarSink for NullSink {
    fn add_scalar(&mut self, _tag: &str, _value: f32, _step: usize) -> std::io::Result<()> {
        Ok(())
    }
}

/// CSV scalar log at `<log_dir>/<run_name>/scalars.csv` with rows
/// `step,tag,value,wall_time`.
pub struct TensorboardWriter {
    log_dir: PathBuf,
    started: Instant,
    scalar_writer: BufWriter<File>,
}

impl TensorboardWriter {
    pub fn new<P: AsRef<Path>>(log_dir: P, run_name: &str) -> std::io::Result<Self> {
        let log_path = log_dir.as_ref().join(run_name);
        create_dir_all(&log_path)?;

        let mut scalar_writer = BufWriter::new(File::create(log_path.join("scalars.csv"))?);
        writeln!(scalar_writer, "step,tag,value,wall_time")?;

        Ok(TensorboardWriter {
            log_dir: log_path,
            started: Instant::now(),
            scalar_writer,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn scalars_path(&self) -> PathBuf {
        self.log_dir.join("scalars.csv")
    }
}

impl ScalarSink for TensorboardWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> std::io::Result<()> {
        let wall_time = self.started.elapsed().as_secs_f64();
        // Tags are free text; keep the CSV columns intact
        let tag = tag.replace(',', ";");
        writeln!(self.scalar_writer, "{},{},{},{:.3}", step, tag, value, wall_time)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.scalar_writer.flush()
    }
}

impl Drop for TensorboardWriter {
    fn drop(&mut self) {
        let _ = self.scalar_writer.flush();
    }
}
