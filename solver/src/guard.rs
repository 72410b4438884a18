//! Reference `Guard` implementation.
//!
//! Callers treat `Guard` as an opaque boolean algebra over symbolic path
//! variables (`and`/`or`/`not`/`is_true`/`is_false`). This module supplies one
//! concrete, fully decidable implementation so the engine and its tests don't
//! need a real SAT/BDD backend wired in: a guard is a sum-of-products (DNF)
//! over signed atom ids. `and`/`or`/`not` distribute the usual way; a clause
//! containing both polarities of the same atom is a contradiction and is
//! dropped. This does not try to be fast for large guards — it tries to be
//! obviously correct.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// A single signed literal: atom id plus polarity.
type Literal = (u32, bool);

/// A conjunction of literals (a DNF clause). Empty clause == tautology.
type Clause = BTreeSet<Literal>;

/// A boolean expression over symbolic path variables, in DNF.
///
/// `Guard::true_()` is the single-empty-clause canonical form; `Guard::false_()`
/// has zero clauses. Every constructor re-establishes that canonical form so
/// `is_true`/`is_false` are simple structural checks.
#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Guard {
    clauses: BTreeSet<Clause>,
}

impl Guard {
    pub fn false_() -> Self {
        Guard { clauses: BTreeSet::new() }
    }

    pub fn true_() -> Self {
        let mut clauses = BTreeSet::new();
        clauses.insert(Clause::new());
        Guard { clauses }
    }

    /// A single fresh atomic variable, positive polarity. Pair with
    /// `GuardFactory::fresh` to get a globally-unique id.
    pub fn atom(id: u32) -> Self {
        let mut clause = Clause::new();
        clause.insert((id, true));
        let mut clauses = BTreeSet::new();
        clauses.insert(clause);
        Guard { clauses }
    }

    pub fn is_false(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn is_true(&self) -> bool {
        self.clauses.len() == 1 && self.clauses.iter().next().is_some_and(Clause::is_empty)
    }

    pub fn and(&self, other: &Guard) -> Guard {
        let mut clauses = BTreeSet::new();
        for a in &self.clauses {
            for b in &other.clauses {
                if let Some(merged) = merge_clause(a, b) {
                    clauses.insert(merged);
                }
            }
        }
        simplify(clauses)
    }

    pub fn or(&self, other: &Guard) -> Guard {
        let mut clauses = self.clauses.clone();
        clauses.extend(other.clauses.iter().cloned());
        simplify(clauses)
    }

    pub fn not(&self) -> Guard {
        // De Morgan: NOT(c1 OR c2 OR ...) = AND(NOT c1, NOT c2, ...)
        // NOT(clause) = OR of negated literals in that clause.
        let mut acc = Guard::true_();
        for clause in &self.clauses {
            if clause.is_empty() {
                // NOT(true) = false, short-circuits the whole conjunction.
                return Guard::false_();
            }
            let mut negated = Guard::false_();
            for &(id, polarity) in clause {
                negated = negated.or(&Guard::literal(id, !polarity));
            }
            acc = acc.and(&negated);
        }
        acc
    }

    fn literal(id: u32, polarity: bool) -> Guard {
        let mut clause = Clause::new();
        clause.insert((id, polarity));
        let mut clauses = BTreeSet::new();
        clauses.insert(clause);
        Guard { clauses }
    }

    /// Number of DNF clauses, exposed for diagnostics / tests only.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }
}

fn merge_clause(a: &Clause, b: &Clause) -> Option<Clause> {
    let mut merged = a.clone();
    for &(id, polarity) in b {
        if merged.contains(&(id, !polarity)) {
            return None; // contradiction: atom asserted both ways
        }
        merged.insert((id, polarity));
    }
    Some(merged)
}

/// Drop clauses subsumed by a tautological clause and dedupe.
fn simplify(clauses: BTreeSet<Clause>) -> Guard {
    if clauses.iter().any(Clause::is_empty) {
        return Guard::true_();
    }
    Guard { clauses }
}

/// Allocates globally-unique atom ids for fresh symbolic path variables.
///
/// One instance is owned by the scheduler's `RuntimeContext`; every data
/// choice and every `ChoiceOrchestrator::Random` seed draw that needs a new
/// branch variable goes through it so ids never collide across a run.
#[derive(Debug)]
pub struct GuardFactory {
    next: AtomicU32,
}

impl Default for GuardFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardFactory {
    pub fn new() -> Self {
        GuardFactory { next: AtomicU32::new(0) }
    }

    pub fn fresh(&self) -> Guard {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Guard::atom(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_and_false_identities() {
        let t = Guard::true_();
        let f = Guard::false_();
        assert!(t.is_true());
        assert!(f.is_false());
        assert!(t.and(&f).is_false());
        assert!(t.or(&f).is_true());
        assert!(f.not().is_true());
        assert!(t.not().is_false());
    }

    #[test]
    fn atom_disjoint_from_its_negation() {
        let factory = GuardFactory::new();
        let a = factory.fresh();
        let not_a = a.not();
        assert!(a.and(&not_a).is_false());
        assert!(a.or(&not_a).is_true());
    }

    #[test]
    fn or_then_and_distributes() {
        let factory = GuardFactory::new();
        let a = factory.fresh();
        let b = factory.fresh();
        let ab = a.or(&b);
        // (a or b) and not a == b and not a (still satisfiable, not false)
        let reduced = ab.and(&a.not());
        assert!(!reduced.is_false());
        assert!(reduced.and(&a).is_false());
    }
}
