use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed for {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("checkpoint at {path} is not valid JSON: {source}")]
    Decode { path: PathBuf, #[source] source: serde_json::Error },

    #[error("no checkpoint found at {0}")]
    NotFound(PathBuf),
}
