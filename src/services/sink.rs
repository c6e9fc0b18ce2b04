//! Result Sink
//!
//! Append-only results log: one `rank,regularization,confidence,precision`
//! line per grid point. Appends are serialized through an internal mutex so
//! a future parallel sweep cannot interleave lines; an existing log is
//! extended, never truncated.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::error::{EvalError, Result};
use crate::models::EvaluationResult;

pub struct ResultSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultSink {
    /// Open (or create) the results log in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result row. The whole line is written under the lock.
    pub fn append(&self, result: &EvaluationResult) -> Result<()> {
        let line = format!(
            "{},{},{},{}\n",
            result.config.rank,
            result.config.regularization,
            result.config.confidence,
            result.precision_at_k
        );

        let mut file = self
            .file
            .lock()
            .map_err(|_| EvalError::Persistence("results log lock poisoned".to_string()))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        info!(
            rank = result.config.rank,
            regularization = result.config.regularization,
            confidence = result.config.confidence,
            precision_at_k = result.precision_at_k,
            aligned_users = result.aligned_users,
            "Result appended"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HyperparameterConfig;

    fn result(rank: usize, precision: f64) -> EvaluationResult {
        EvaluationResult {
            config: HyperparameterConfig {
                rank,
                regularization: 1.0,
                confidence: 40.0,
            },
            precision_at_k: precision,
            aligned_users: 10,
        }
    }

    #[test]
    fn test_appends_one_line_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");

        let sink = ResultSink::open(&path).unwrap();
        sink.append(&result(75, 0.25)).unwrap();
        sink.append(&result(100, 0.5)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "75,1,40,0.25\n100,1,40,0.5\n");
    }

    #[test]
    fn test_reopen_extends_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");

        {
            let sink = ResultSink::open(&path).unwrap();
            sink.append(&result(75, 0.25)).unwrap();
        }
        {
            let sink = ResultSink::open(&path).unwrap();
            sink.append(&result(150, 0.75)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("75,"));
        assert!(contents.ends_with("150,1,40,0.75\n"));
    }
}
