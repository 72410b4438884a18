//! The concrete value type carried by `PrimitiveVS<Value>` local-state slots.
//!
//! Machine semantics (the event handlers that produce these values) live
//! outside this crate; this enum is only what the scheduler needs to hash,
//! compare, and serialize a machine's local state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a machine instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// One primitive value a machine's local state (or a message payload) can
/// hold. Deliberately small and closed — the value-summary algebra treats
/// its payload as opaque, but the values it carries still need to be
/// hashable/comparable for `StateCache`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
    Machine(MachineId),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Machine(m) => write!(f, "{m}"),
        }
    }
}
