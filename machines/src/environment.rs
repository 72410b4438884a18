//! `MachineEnvironment`: the trait boundary the scheduler drives.
//!
//! `current_machines`, `get_local_state`/`set_local_state`/`reset`,
//! `send_buffer`, `get_next_sender`/`get_next_sender_choices`,
//! `perform_effect`, `rm_buffer` — the scheduler crate depends only on this
//! trait (plus `solver`), never on a concrete machine implementation.

use solver::{Guard, PrimitiveVS};
use thiserror::Error;

use crate::message::Message;
use crate::value::{MachineId, Value};

/// A machine's local state: one value summary per state variable, in
/// declaration order.
pub type LocalState = Vec<PrimitiveVS<Value>>;

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("unknown machine {0}")]
    UnknownMachine(MachineId),
    #[error("effect rejected: {0}")]
    EffectRejected(String),
    /// An assertion inside the program under test failed during
    /// `perform_effect`. Distinct from `EffectRejected`: this means the
    /// machine semantics themselves detected a broken invariant, not that
    /// the scheduler handed it a malformed effect.
    #[error("property violated: {0}")]
    PropertyViolation(String),
}

/// The live machine set plus the queueing operations the scheduler performs
/// against it. One step touches this trait and nothing else.
pub trait MachineEnvironment {
    /// `current_machines`, in the order new machines were created —
    /// iteration order matters for deterministic candidate generation.
    fn current_machines(&self) -> Vec<MachineId>;

    fn get_local_state(&self, id: MachineId) -> Result<LocalState, MachineError>;
    fn set_local_state(&mut self, id: MachineId, state: LocalState) -> Result<(), MachineError>;
    fn reset(&mut self, id: MachineId) -> Result<(), MachineError>;

    fn send_buffer_is_empty(&self, id: MachineId) -> Result<bool, MachineError>;
    fn satisfies_pred_under_guard(
        &self,
        id: MachineId,
        pred: &dyn Fn(&Message) -> bool,
    ) -> Result<Guard, MachineError>;

    /// Guard under which `id` is currently halted (`Guard::false_()` if it
    /// can never be halted on the current path).
    fn halted_guard(&self, id: MachineId) -> Result<Guard, MachineError>;

    /// `get_next_sender`: a value summary over which machine sends next,
    /// already restricted to machines with a non-empty buffer.
    fn get_next_sender(&self) -> PrimitiveVS<MachineId>;

    /// `get_next_sender_choices`: the unreduced candidate list, before
    /// `ChoiceSelector`/`ChoiceOrchestrator` picks among them. One
    /// `PrimitiveVS<MachineId>` per eligible sender, which is what lets
    /// `get_next` restrict/reduce/reorder them generically.
    fn get_next_sender_choices(&self) -> Vec<PrimitiveVS<MachineId>>;

    /// Remove exactly one message from `id`'s buffer restricted to `guard`.
    fn rm_buffer(&mut self, id: MachineId, guard: &Guard) -> Result<Option<Message>, MachineError>;

    /// Garbage-collect halted-target remnants from `id`'s buffer.
    fn gc_halted_targets(&mut self, id: MachineId) -> Result<(), MachineError>;

    /// Dispatch the merged effect to its target.
    fn perform_effect(&mut self, effect: Message) -> Result<(), MachineError>;
}
