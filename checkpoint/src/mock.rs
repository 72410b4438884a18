//! In-memory `CheckpointStore`: a fast, filesystem-free double for tests
//! that don't care about atomicity.

use std::sync::Mutex;

use crate::error::CheckpointError;
use crate::image::CheckpointImage;
use crate::store::CheckpointStore;

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    slot: Mutex<Option<CheckpointImage>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&self, image: &CheckpointImage) -> Result<(), CheckpointError> {
        *self.slot.lock().unwrap() = Some(image.clone());
        Ok(())
    }

    fn load(&self) -> Result<CheckpointImage, CheckpointError> {
        self.slot.lock().unwrap().clone().ok_or_else(|| CheckpointError::NotFound("<memory>".into()))
    }

    fn exists(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::{CoverageStats, IterationCounters, Schedule};
    use std::collections::HashMap;

    #[test]
    fn save_then_load_round_trips() {
        let store = InMemoryCheckpointStore::new();
        let image = CheckpointImage {
            schedule: Schedule::new(),
            counters: IterationCounters::default(),
            coverage: CoverageStats::new(),
            global_creation_counters: HashMap::new(),
            result: "incomplete".to_string(),
        };
        store.save(&image).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap().result, "incomplete");
    }
}
