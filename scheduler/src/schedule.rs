//! `Schedule` — an ordered sequence of `Choice`s indexed by choice depth,
//! owning a `filter: Guard` that restricts the path condition for all
//! subsequent choices.

use serde::{Deserialize, Serialize};
use solver::Guard;

use crate::choice::Choice;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    choices: Vec<Choice>,
    pub filter: Guard,
}

impl Schedule {
    pub fn new() -> Self {
        Schedule { choices: Vec::new(), filter: Guard::true_() }
    }

    pub fn size(&self) -> usize {
        self.choices.len()
    }

    pub fn get(&self, d: usize) -> Option<&Choice> {
        self.choices.get(d)
    }

    pub fn get_mut(&mut self, d: usize) -> Option<&mut Choice> {
        self.choices.get_mut(d)
    }

    /// Appends at depth `schedule.size()`, returning the depth it landed at.
    pub fn push(&mut self, choice: Choice) -> usize {
        self.choices.push(choice);
        self.choices.len() - 1
    }

    /// Overwrites the Choice already present at `d`, or appends if `d` is
    /// exactly the next free depth (the "record it at depth d" step of
    /// `get_next`).
    pub fn set(&mut self, d: usize, choice: Choice) {
        if d < self.choices.len() {
            self.choices[d] = choice;
        } else {
            debug_assert_eq!(d, self.choices.len());
            self.choices.push(choice);
        }
    }

    /// Drops every Choice at or beyond `d` — used when `post_iteration_cleanup`
    /// clears a depth entirely.
    pub fn truncate(&mut self, d: usize) {
        self.choices.truncate(d);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn restrict_filter(&mut self, guard: &Guard) {
        self.filter = self.filter.and(guard);
    }

    pub fn is_exhausted(&self) -> bool {
        self.filter.is_false()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Vs;

    #[test]
    fn new_schedule_has_true_filter_and_zero_size() {
        let s = Schedule::new();
        assert_eq!(s.size(), 0);
        assert!(!s.is_exhausted());
    }

    #[test]
    fn push_then_get_round_trips() {
        let mut s = Schedule::new();
        let c = Choice::new(Vs::empty(), false, 0, 0);
        let d = s.push(c);
        assert_eq!(d, 0);
        assert!(s.get(0).is_some());
    }

    #[test]
    fn restrict_filter_to_false_marks_exhausted() {
        let mut s = Schedule::new();
        s.restrict_filter(&Guard::false_());
        assert!(s.is_exhausted());
    }
}
