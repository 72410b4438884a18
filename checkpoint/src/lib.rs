//! Whole-engine checkpointing: atomic snapshot/restore of a search in
//! progress, plus the append-only backtrack task log.

pub mod backtrack_writer;
pub mod error;
pub mod image;
pub mod mock;
pub mod store;

pub use backtrack_writer::{BacktrackLogEntry, BacktrackWriter};
pub use error::CheckpointError;
pub use image::CheckpointImage;
pub use mock::InMemoryCheckpointStore;
pub use store::{backtrack_file_name, backtrack_file_path, CheckpointStore, FileCheckpointStore};
