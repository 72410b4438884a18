//! `BacktrackWriter` — an append-only log kept alongside the individually
//! serialized backtrack task files, one JSON line per recorded task.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::store::backtrack_file_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackLogEntry {
    pub step: usize,
    pub choice_depth: usize,
    pub task_id: u64,
    pub pid: u32,
    pub file_name: String,
}

/// Appends one JSON-line entry per serialized backtrack file. A plain
/// append-only log rather than a database: entries are write-once and read
/// back sequentially by whatever process resumes the run.
pub struct BacktrackWriter {
    log_path: PathBuf,
}

impl BacktrackWriter {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        BacktrackWriter { log_path: log_path.into() }
    }

    pub fn record(&self, step: usize, choice_depth: usize, task_id: u64, pid: u32) -> Result<(), CheckpointError> {
        let entry = BacktrackLogEntry {
            step,
            choice_depth,
            task_id,
            pid,
            file_name: backtrack_file_name(step, choice_depth, task_id, pid),
        };
        let mut file = self.open().map_err(|source| CheckpointError::Io { path: self.log_path.clone(), source })?;
        let line = serde_json::to_string(&entry)
            .map_err(|source| CheckpointError::Decode { path: self.log_path.clone(), source })?;
        writeln!(file, "{line}").map_err(|source| CheckpointError::Io { path: self.log_path.clone(), source })?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<BacktrackLogEntry>, CheckpointError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.log_path)
            .map_err(|source| CheckpointError::Io { path: self.log_path.clone(), source })?;
        contents
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| {
                serde_json::from_str(l).map_err(|source| CheckpointError::Decode { path: self.log_path.clone(), source })
            })
            .collect()
    }

    fn open(&self) -> std::io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.log_path)
    }
}

pub fn backtrack_dir_default(base: &Path) -> PathBuf {
    base.join("backtracks")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BacktrackWriter::new(dir.path().join("backtracks.log"));
        writer.record(10, 3, 7, 42).unwrap();
        writer.record(11, 4, 7, 42).unwrap();
        let entries = writer.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "prefix_d10_cd3_task7_pid42.out");
    }

    #[test]
    fn reading_a_missing_log_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BacktrackWriter::new(dir.path().join("absent.log"));
        assert!(writer.read_all().unwrap().is_empty());
    }
}
