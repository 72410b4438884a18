//! Messages and per-machine send buffers.

use serde::{Deserialize, Serialize};
use solver::{Guard, GuardedValue};

use crate::value::{MachineId, Value};

/// One merged message, ready to be handed to `perform_effect`.
///
/// A step may remove one message from each of several eligible senders and
/// merge them into a single effect (first becomes base; rest are merged
/// in). The merge itself is a machine-semantics concern; `Message::merge`
/// here only concatenates payloads, which is enough for this crate's
/// reference `MachineEnvironment` and its tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub target: MachineId,
    pub event: String,
    pub payload: Vec<Value>,
    /// True for machine-creation and synchronous-event effects — drives the
    /// sticky-step rule (a step with exactly one eligible sender and a
    /// sticky effect holds the step depth instead of advancing it).
    pub is_sticky: bool,
}

impl Message {
    pub fn new(target: MachineId, event: impl Into<String>, payload: Vec<Value>) -> Self {
        Message { target, event: event.into(), payload, is_sticky: false }
    }

    pub fn sticky(mut self) -> Self {
        self.is_sticky = true;
        self
    }

    pub fn merge(mut self, other: Message) -> Self {
        self.payload.extend(other.payload);
        self.is_sticky = self.is_sticky || other.is_sticky;
        self
    }
}

/// A machine's pending-message queue: each entry is a message guarded by the
/// path condition under which it was enqueued.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SendBuffer {
    entries: Vec<GuardedValue<Message>>,
}

impl SendBuffer {
    pub fn new() -> Self {
        SendBuffer::default()
    }

    pub fn push(&mut self, guard: Guard, message: Message) {
        if !guard.is_false() {
            self.entries.push(GuardedValue { guard, value: message });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GuardedValue<Message>] {
        &self.entries
    }

    /// Summarize, per message satisfying `pred`, the guard under which that
    /// holds.
    pub fn satisfies_pred_under_guard(&self, pred: impl Fn(&Message) -> bool) -> Guard {
        self.entries
            .iter()
            .filter(|e| pred(&e.value))
            .fold(Guard::false_(), |acc, e| acc.or(&e.guard))
    }

    /// `rm_buffer(machine, guard)`: remove exactly one message restricted to
    /// `guard`, returning it with its guard narrowed to the intersection.
    pub fn remove_restricted(&mut self, guard: &Guard) -> Option<GuardedValue<Message>> {
        let idx = self.entries.iter().position(|e| !e.guard.and(guard).is_false())?;
        let mut removed = self.entries.remove(idx);
        removed.guard = removed.guard.and(guard);
        Some(removed)
    }

    /// Drop the portion of each message guarded by a sub-guard under which
    /// *its target* is halted. `halted_guard_of` looks up that per-message
    /// target's halted guard, since a single buffer can hold messages
    /// addressed to different machines.
    pub fn gc_halted(&mut self, halted_guard_of: &dyn Fn(MachineId) -> Guard) {
        for entry in &mut self.entries {
            let not_halted = halted_guard_of(entry.value.target).not();
            entry.guard = entry.guard.and(&not_halted);
        }
        self.entries.retain(|e| !e.guard.is_false());
    }
}

