//! `CheckpointStore` — the persistence boundary: atomic write of
//! (schedule, global data) to a file, with readback restoring the
//! scheduler to that exact point. Synchronous and single-record, since
//! there is exactly one live checkpoint per run and no background
//! writer thread.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CheckpointError;
use crate::image::CheckpointImage;

pub trait CheckpointStore {
    fn save(&self, image: &CheckpointImage) -> Result<(), CheckpointError>;
    fn load(&self) -> Result<CheckpointImage, CheckpointError>;
    fn exists(&self) -> bool;
}

/// Writes to `path` via a sibling temp file plus `rename`, so a reader never
/// observes a half-written checkpoint — a crash mid-write leaves the old
/// file (or nothing) rather than truncated JSON.
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCheckpointStore { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        let mut file_name = tmp.file_name().unwrap_or_default().to_os_string();
        file_name.push(".tmp");
        tmp.set_file_name(file_name);
        tmp
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&self, image: &CheckpointImage) -> Result<(), CheckpointError> {
        let tmp = self.tmp_path();
        let json = serde_json::to_vec_pretty(image)
            .map_err(|source| CheckpointError::Decode { path: self.path.clone(), source })?;
        fs::write(&tmp, &json).map_err(|source| CheckpointError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &self.path).map_err(|source| CheckpointError::Io { path: self.path.clone(), source })?;
        info!(path = %self.path.display(), "wrote checkpoint");
        Ok(())
    }

    fn load(&self) -> Result<CheckpointImage, CheckpointError> {
        if !self.path.exists() {
            return Err(CheckpointError::NotFound(self.path.clone()));
        }
        let bytes =
            fs::read(&self.path).map_err(|source| CheckpointError::Io { path: self.path.clone(), source })?;
        serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Decode { path: self.path.clone(), source })
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// `prefix_d{step}_cd{d}_task{id}_pid{pid}.out` — the per-backtrack task
/// file naming scheme.
pub fn backtrack_file_name(step: usize, choice_depth: usize, task_id: u64, pid: u32) -> String {
    format!("prefix_d{step}_cd{choice_depth}_task{task_id}_pid{pid}.out")
}

pub fn backtrack_file_path(dir: &Path, step: usize, choice_depth: usize, task_id: u64, pid: u32) -> PathBuf {
    dir.join(backtrack_file_name(step, choice_depth, task_id, pid))
}
