//! `ValueSummary` and `PrimitiveVS`: a guarded disjunction of concrete values.
//!
//! A value summary is ⋁ᵢ (gᵢ ⇒ vᵢ) with pairwise disjoint `gᵢ`. This module
//! keeps that invariant on construction rather than asserting it after the
//! fact: every constructor that could introduce an overlap merges or
//! restricts the incoming guard against what's already claimed.

use serde::{Deserialize, Serialize};

use crate::guard::Guard;

/// One concrete value paired with the path condition under which it holds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardedValue<T> {
    pub guard: Guard,
    pub value: T,
}

/// A guarded disjunction over a primitive (`Clone + PartialEq`) value type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrimitiveVS<T> {
    values: Vec<GuardedValue<T>>,
}

impl<T: Clone + PartialEq> PrimitiveVS<T> {
    pub fn empty() -> Self {
        PrimitiveVS { values: Vec::new() }
    }

    /// Build from guarded values, merging entries that carry an `==` value
    /// (their guards are OR'd) and dropping any whose guard reduces to false.
    pub fn from_guarded(values: impl IntoIterator<Item = GuardedValue<T>>) -> Self {
        let mut merged: Vec<GuardedValue<T>> = Vec::new();
        for gv in values {
            if gv.guard.is_false() {
                continue;
            }
            if let Some(existing) = merged.iter_mut().find(|e| e.value == gv.value) {
                existing.guard = existing.guard.or(&gv.guard);
            } else {
                merged.push(gv);
            }
        }
        PrimitiveVS { values: merged }
    }

    pub fn single(value: T, guard: Guard) -> Self {
        Self::from_guarded([GuardedValue { guard, value }])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The union of every guard in this summary: "any path that reaches one
    /// of these values."
    pub fn universe(&self) -> Guard {
        self.values
            .iter()
            .fold(Guard::false_(), |acc, gv| acc.or(&gv.guard))
    }

    pub fn guarded_values(&self) -> &[GuardedValue<T>] {
        &self.values
    }

    /// Restrict every branch to `g`, dropping branches that become empty.
    pub fn restrict(&self, g: &Guard) -> Self {
        let restricted = self
            .values
            .iter()
            .map(|gv| GuardedValue { guard: gv.guard.and(g), value: gv.value.clone() })
            .filter(|gv| !gv.guard.is_false());
        Self::from_guarded(restricted)
    }

    /// Disjoint union with `other`. Used to merge per-sender removed
    /// messages into one effect and to union choice candidate lists.
    pub fn merge(&self, other: &Self) -> Self {
        Self::from_guarded(self.values.iter().chain(other.values.iter()).cloned())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
