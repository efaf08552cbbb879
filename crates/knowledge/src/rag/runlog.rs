//! Append-only JSONL run log.

use crate::rag::types::ConsensusResult;
use cotrag_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Run log file, named once per process run as `<unix-seconds>.jsonl`.
///
/// The file is created on the first append, so a process that never
/// completes a run leaves nothing behind.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl RunLog {
    /// Create a run log inside `dir`, named after the current time.
    pub fn new(dir: &Path) -> Self {
        let name = format!("{}.jsonl", chrono::Utc::now().timestamp());
        Self::at(dir.join(name))
    }

    /// Create a run log at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one result as a single JSON line.
    ///
    /// The whole line goes out in one `write_all` under the lock, so
    /// concurrent appends never interleave within a record.
    pub fn append(&self, result: &ConsensusResult) -> AppResult<()> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');

        let mut guard = self
            .file
            .lock()
            .map_err(|_| AppError::Other("Run log lock poisoned".to_string()))?;

        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            tracing::debug!("Opened run log: {:?}", self.path);
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            file.write_all(&line)?;
            file.flush()?;
        }

        tracing::debug!(run_id = %result.meta.run_id, "Appended run to {:?}", self.path);
        Ok(())
    }
}
