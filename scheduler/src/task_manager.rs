//! `TaskManager` — a tree of `BacktrackTask`s representing schedule
//! prefixes still owed further exploration.

use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::TaskOrchestration;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackTask {
    pub id: u64,
    pub parent: Option<u64>,
    pub children: Vec<u64>,
    pub depth: usize,
    pub choice_depth: usize,
    pub choices: Schedule,
    pub prefix_coverage: f64,
    pub priority: f64,
    pub num_backtracks: usize,
    pub num_data_backtracks: usize,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskManager {
    all_tasks: HashMap<u64, BacktrackTask>,
    pending: Vec<u64>,
    finished: Vec<u64>,
    next_id: u64,
}

impl TaskManager {
    pub fn new(initial_schedule: Schedule) -> Self {
        let root = BacktrackTask {
            id: 0,
            parent: None,
            children: Vec::new(),
            depth: 0,
            choice_depth: 0,
            choices: initial_schedule,
            prefix_coverage: 1.0,
            priority: 1.0,
            num_backtracks: 0,
            num_data_backtracks: 0,
            completed: false,
        };
        let mut all_tasks = HashMap::new();
        all_tasks.insert(0, root);
        TaskManager { all_tasks, pending: Vec::new(), finished: Vec::new(), next_id: 1 }
    }

    pub fn get(&self, id: u64) -> Option<&BacktrackTask> {
        self.all_tasks.get(&id)
    }

    pub fn num_pending_backtracks(&self) -> usize {
        self.pending.iter().filter_map(|id| self.all_tasks.get(id)).map(|t| t.num_backtracks).sum()
    }

    /// After an iteration ends, walk `schedule`'s depths bottom-up and turn
    /// each non-empty `backtrack` into a child task of `parent_id`, bounded
    /// by `max_tasks`. If the bound would be exceeded partway through, the
    /// remaining depths collapse into one combined task preserving the
    /// whole suffix from the first uncovered depth onward.
    pub fn set_backtrack_tasks(&mut self, parent_id: u64, schedule: &Schedule, max_tasks: usize) {
        let backtrack_depths: Vec<usize> =
            (0..schedule.size()).filter(|&d| schedule.get(d).is_some_and(|c| c.has_backtrack())).collect();

        if let Some(parent) = self.all_tasks.get_mut(&parent_id) {
            parent.completed = true;
        }
        self.finished.push(parent_id);

        let mut created = 0usize;
        let mut iter = backtrack_depths.into_iter().peekable();
        while let Some(d) = iter.next() {
            let exact = created + 1 < max_tasks || iter.peek().is_none();
            let mut cloned = schedule.clone();
            for dd in 0..d {
                if let Some(c) = cloned.get_mut(dd) {
                    c.backtrack.clear();
                }
            }
            if exact {
                cloned.truncate(d + 1);
            }
            let num_backtracks =
                cloned.get(d).map(|c| c.backtrack.iter().filter(|b| !b.is_empty()).count()).unwrap_or(0);
            let id = self.next_id;
            self.next_id += 1;
            let task = BacktrackTask {
                id,
                parent: Some(parent_id),
                children: Vec::new(),
                depth: d,
                choice_depth: d,
                choices: cloned,
                prefix_coverage: 1.0 / ((created + 2) as f64),
                priority: 1.0,
                num_backtracks,
                num_data_backtracks: 0,
                completed: false,
            };
            if let Some(parent) = self.all_tasks.get_mut(&parent_id) {
                parent.children.push(id);
            }
            self.all_tasks.insert(id, task);
            self.pending.push(id);
            created += 1;
            if !exact {
                break;
            }
        }
    }

    /// Picks and removes the next pending task per `orchestration`. `None`
    /// for `DepthFirst` — the task manager stays idle; the caller resumes
    /// from the in-schedule backtrack instead.
    pub fn get_next_task(&mut self, orchestration: TaskOrchestration, rng: &mut StdRng) -> Option<BacktrackTask> {
        match orchestration {
            TaskOrchestration::DepthFirst => None,
            TaskOrchestration::Random => {
                if self.pending.is_empty() {
                    return None;
                }
                let idx = rng.gen_range(0..self.pending.len());
                let id = self.pending.remove(idx);
                self.all_tasks.get(&id).cloned()
            }
            TaskOrchestration::CoverageAStar | TaskOrchestration::Learn => {
                let best = self
                    .pending
                    .iter()
                    .enumerate()
                    .max_by(|a, b| {
                        let pa = self.all_tasks.get(a.1).map(|t| t.priority).unwrap_or(0.0);
                        let pb = self.all_tasks.get(b.1).map(|t| t.priority).unwrap_or(0.0);
                        pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(i, &id)| (i, id));
                if let Some((i, id)) = best {
                    self.pending.remove(i);
                    self.all_tasks.get(&id).cloned()
                } else {
                    None
                }
            }
        }
    }

    pub fn new_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
