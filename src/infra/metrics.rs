// ============================================================
// Layer 6: Metrics Writer
// ============================================================
// Appends tagged scalar series to a CSV file so learning curves
// can be plotted after a run.
//
// Tags written by the trainer:
//   training/steps_avg_loss     step = global step
//   training/epoch_avg_loss     step = epoch
//   validation/epoch_avg_loss   step = epoch
//
// Example CSV output:
//   tag,step,value
//   training/steps_avg_loss,100,0.693120
//   training/epoch_avg_loss,1,0.681004
//
// Output file: {log_dir}/metrics.csv

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Writes scalar metrics to a CSV file, appending across runs.
#[derive(Debug)]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "tag,step,value")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one scalar as a new row.
    pub fn add_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;
        writeln!(f, "{tag},{step},{value:.6}")?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_after_header() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();

        logger.add_scalar("training/steps_avg_loss", 0.5, 10).unwrap();
        logger.add_scalar("training/epoch_avg_loss", 0.25, 1).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, [
            "tag,step,value",
            "training/steps_avg_loss,10,0.500000",
            "training/epoch_avg_loss,1,0.250000",
        ]);
    }

    #[test]
    fn test_header_written_once_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        MetricsLogger::new(tmp.path()).unwrap().add_scalar("a", 1.0, 1).unwrap();
        MetricsLogger::new(tmp.path()).unwrap().add_scalar("a", 2.0, 2).unwrap();

        let text = fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        assert_eq!(text.matches("tag,step,value").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }
}
