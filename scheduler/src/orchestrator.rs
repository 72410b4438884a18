//! `ChoiceOrchestrator` — given more than one candidate alternative,
//! decides which one becomes `chosen` and in what order the rest populate
//! `backtrack`. Four strategies, selected by
//! [`ChoiceOrchestration`](crate::config::ChoiceOrchestration).

use machines::Value;
use rand::{rngs::StdRng, Rng, SeedableRng};
use solver::GuardedValue;

use crate::config::ChoiceOrchestration;
use crate::coverage::CoverageStats;

/// One candidate alternative together with the key the learning strategies
/// index their Q-table by. `key` is caller-supplied (typically the
/// candidate's `Display` form) since `Value` itself isn't a convenient map
/// key at the granularity QLearning wants.
pub struct Candidate {
    pub value: GuardedValue<Value>,
    pub key: String,
}

pub enum ChoiceOrchestrator {
    None,
    Random { rng: StdRng },
    QLearning,
    EpsilonGreedy { rng: StdRng, epsilon: f64 },
}

impl ChoiceOrchestrator {
    pub fn new(kind: ChoiceOrchestration, seed: u64, epsilon: f64) -> Self {
        match kind {
            ChoiceOrchestration::None => ChoiceOrchestrator::None,
            ChoiceOrchestration::Random => ChoiceOrchestrator::Random { rng: StdRng::seed_from_u64(seed) },
            ChoiceOrchestration::QLearning => ChoiceOrchestrator::QLearning,
            ChoiceOrchestration::EpsilonGreedy => {
                ChoiceOrchestrator::EpsilonGreedy { rng: StdRng::seed_from_u64(seed), epsilon }
            }
        }
    }

    /// Reorders `candidates` in place so `candidates[0]` becomes `chosen`
    /// and the rest populate `backtrack`, in the order the caller will pop
    /// them from. Does nothing to a slice of length <= 1.
    pub fn order(&mut self, candidates: &mut Vec<Candidate>, state_hash: u64, coverage: &CoverageStats) {
        if candidates.len() <= 1 {
            return;
        }
        match self {
            ChoiceOrchestrator::None => {}
            ChoiceOrchestrator::Random { rng } => shuffle(candidates, rng),
            ChoiceOrchestrator::QLearning => {
                sort_by_q_desc(candidates, state_hash, coverage);
            }
            ChoiceOrchestrator::EpsilonGreedy { rng, epsilon } => {
                if rng.gen::<f64>() < *epsilon {
                    shuffle(candidates, rng);
                } else {
                    sort_by_q_desc(candidates, state_hash, coverage);
                }
            }
        }
    }

    /// Q-learning feedback after an execution reaches its outcome. A no-op
    /// for strategies that don't learn.
    pub fn observe_outcome(&self, coverage: &mut CoverageStats, state_hash: u64, key: &str, reward: f64) {
        match self {
            ChoiceOrchestrator::QLearning | ChoiceOrchestrator::EpsilonGreedy { .. } => {
                let old = coverage.q_value(state_hash, key);
                let learning_rate = 0.3;
                coverage.update_q_value(state_hash, key, old + learning_rate * (reward - old));
            }
            _ => {}
        }
    }
}

fn shuffle(candidates: &mut [Candidate], rng: &mut StdRng) {
    // Fisher-Yates.
    for i in (1..candidates.len()).rev() {
        let j = rng.gen_range(0..=i);
        candidates.swap(i, j);
    }
}

fn sort_by_q_desc(candidates: &mut [Candidate], state_hash: u64, coverage: &CoverageStats) {
    candidates.sort_by(|a, b| {
        let qa = coverage.q_value(state_hash, &a.key);
        let qb = coverage.q_value(state_hash, &b.key);
        qb.partial_cmp(&qa).unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver::GuardFactory;

    fn candidate(factory: &GuardFactory, n: i64) -> Candidate {
        Candidate { value: GuardedValue { guard: factory.fresh(), value: Value::Int(n) }, key: n.to_string() }
    }

    #[test]
    fn none_leaves_order_untouched() {
        let factory = GuardFactory::default();
        let mut cands = vec![candidate(&factory, 1), candidate(&factory, 2), candidate(&factory, 3)];
        let mut orch = ChoiceOrchestrator::new(ChoiceOrchestration::None, 0, 0.1);
        orch.order(&mut cands, 0, &CoverageStats::new());
        let ns: Vec<i64> = cands.iter().map(|c| if let Value::Int(n) = c.value.value { n } else { 0 }).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[test]
    fn single_candidate_is_a_no_op_for_every_strategy() {
        let factory = GuardFactory::default();
        for kind in [
            ChoiceOrchestration::None,
            ChoiceOrchestration::Random,
            ChoiceOrchestration::QLearning,
            ChoiceOrchestration::EpsilonGreedy,
        ] {
            let mut cands = vec![candidate(&factory, 7)];
            let mut orch = ChoiceOrchestrator::new(kind, 1, 0.5);
            orch.order(&mut cands, 0, &CoverageStats::new());
            assert_eq!(cands.len(), 1);
        }
    }

    #[test]
    fn qlearning_prefers_higher_q_value() {
        let factory = GuardFactory::default();
        let mut cands = vec![candidate(&factory, 1), candidate(&factory, 2)];
        let mut coverage = CoverageStats::new();
        coverage.update_q_value(0, "2", 5.0);
        let mut orch = ChoiceOrchestrator::new(ChoiceOrchestration::QLearning, 0, 0.1);
        orch.order(&mut cands, 0, &coverage);
        match cands[0].value.value {
            Value::Int(n) => assert_eq!(n, 2),
            _ => panic!("expected int"),
        }
    }

    #[test]
    fn random_is_deterministic_for_a_fixed_seed() {
        let factory = GuardFactory::default();
        let mut a = vec![candidate(&factory, 1), candidate(&factory, 2), candidate(&factory, 3), candidate(&factory, 4)];
        let mut b = vec![candidate(&factory, 1), candidate(&factory, 2), candidate(&factory, 3), candidate(&factory, 4)];
        ChoiceOrchestrator::new(ChoiceOrchestration::Random, 42, 0.1).order(&mut a, 0, &CoverageStats::new());
        ChoiceOrchestrator::new(ChoiceOrchestration::Random, 42, 0.1).order(&mut b, 0, &CoverageStats::new());
        let ka: Vec<String> = a.iter().map(|c| c.key.clone()).collect();
        let kb: Vec<String> = b.iter().map(|c| c.key.clone()).collect();
        assert_eq!(ka, kb);
    }
}
