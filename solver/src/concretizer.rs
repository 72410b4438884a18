//! `Concretizer`: picks one concrete assignment out of a `PrimitiveVS`.
//!
//! Kept as a trait so `scheduler` never touches the DNF representation
//! directly. This module supplies the reference implementation used by
//! `StateCache`'s explicit and symbolic enumeration paths.

use crate::guard::Guard;
use crate::value_summary::{GuardedValue, PrimitiveVS};

pub trait Concretizer {
    /// Pick any one guarded value, with no constraint beyond "non-empty
    /// guard". Used by explicit-mode enumeration, where a summary carries
    /// exactly one live branch per step.
    fn concretize<T: Clone + PartialEq>(&self, vs: &PrimitiveVS<T>) -> Option<GuardedValue<T>>;

    /// Pick one guarded value satisfiable under `pc`, returning its guard
    /// restricted to `pc`. Used by `enumerate_concrete_states_from_symbolic`
    /// to peel one concrete assignment off a shrinking path condition.
    ///
    /// Decided behavior: if the *first* branch in iteration order has no
    /// concretization under `pc` (i.e. `branch.guard.and(pc)` is false),
    /// this returns `None` immediately rather than scanning later branches.
    /// Later branches are never tried even if one of them would be
    /// satisfiable.
    fn concretize_under<T: Clone + PartialEq>(
        &self,
        vs: &PrimitiveVS<T>,
        pc: &Guard,
    ) -> Option<GuardedValue<T>>;
}

/// The reference `Concretizer`, built on the DNF `Guard` in this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnfConcretizer;

impl Concretizer for DnfConcretizer {
    fn concretize<T: Clone + PartialEq>(&self, vs: &PrimitiveVS<T>) -> Option<GuardedValue<T>> {
        vs.guarded_values()
            .iter()
            .find(|gv| !gv.guard.is_false())
            .cloned()
    }

    fn concretize_under<T: Clone + PartialEq>(
        &self,
        vs: &PrimitiveVS<T>,
        pc: &Guard,
    ) -> Option<GuardedValue<T>> {
        let first = vs.guarded_values().first()?;
        let restricted = first.guard.and(pc);
        if restricted.is_false() {
            return None;
        }
        Some(GuardedValue { guard: restricted, value: first.value.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concretize_under_picks_first_satisfiable_branch() {
        let factory = crate::guard::GuardFactory::new();
        let a = factory.fresh();
        let b = factory.fresh();
        let vs = PrimitiveVS::from_guarded([
            GuardedValue { guard: a.clone(), value: "left" },
            GuardedValue { guard: b.clone(), value: "right" },
        ]);
        let c = DnfConcretizer;
        let under_not_a = c.concretize_under(&vs, &a.not());
        // First branch ("left", guarded by a) is unsatisfiable under not(a).
        assert!(under_not_a.is_none());
    }

    #[test]
    fn concretize_under_satisfiable_first_branch() {
        let factory = crate::guard::GuardFactory::new();
        let a = factory.fresh();
        let vs = PrimitiveVS::from_guarded([GuardedValue { guard: a.clone(), value: 42 }]);
        let c = DnfConcretizer;
        let picked = c.concretize_under(&vs, &Guard::true_()).unwrap();
        assert_eq!(picked.value, 42);
        assert_eq!(picked.guard, a);
    }
}
