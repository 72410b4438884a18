//! `SymmetryReducer` — external symmetry-class merge, consulted when
//! `symmetry_mode = Full`.
//!
//! The engine itself has no notion of which machines are interchangeable;
//! that judgment is delegated here, the same way `Concretizer` delegates
//! guard solving. The merged classes are carried on the next save point's
//! `SchedulerStateSnapshot::symmetry`.

use machines::{LocalState, MachineId};

pub trait SymmetryReducer {
    /// Partition `machines` (each paired with its current local state) into
    /// symmetry-equivalence classes, called once per step before sender
    /// selection.
    fn merge_classes(&mut self, machines: &[(MachineId, &LocalState)]) -> Vec<Vec<MachineId>>;
}

fn local_state_key(state: &LocalState) -> String {
    format!(
        "{:?}",
        state.iter().map(|vs| vs.guarded_values().iter().map(|gv| gv.value.to_string()).collect::<Vec<_>>()).collect::<Vec<_>>()
    )
}

/// Reference reducer: two machines are symmetric iff their local state is
/// currently identical. Deterministic and stateless — it never remembers a
/// class across steps, so a class can grow or shrink as machines evolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralSymmetryReducer;

impl SymmetryReducer for StructuralSymmetryReducer {
    fn merge_classes(&mut self, machines: &[(MachineId, &LocalState)]) -> Vec<Vec<MachineId>> {
        let mut groups: Vec<(String, Vec<MachineId>)> = Vec::new();
        for &(id, state) in machines {
            let key = local_state_key(state);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, ids)) => ids.push(id),
                None => groups.push((key, vec![id])),
            }
        }
        groups.into_iter().map(|(_, ids)| ids).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machines::Value;
    use solver::{Guard, PrimitiveVS};

    fn state(n: i64) -> LocalState {
        vec![PrimitiveVS::single(Value::Int(n), Guard::true_())]
    }

    #[test]
    fn machines_with_identical_state_merge_into_one_class() {
        let a = state(1);
        let b = state(1);
        let c = state(2);
        let mut reducer = StructuralSymmetryReducer;
        let classes = reducer.merge_classes(&[(MachineId(0), &a), (MachineId(1), &b), (MachineId(2), &c)]);
        assert_eq!(classes.len(), 2);
        let sizes: Vec<usize> = classes.iter().map(Vec::len).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn empty_input_has_no_classes() {
        let mut reducer = StructuralSymmetryReducer;
        assert!(reducer.merge_classes(&[]).is_empty());
    }
}
