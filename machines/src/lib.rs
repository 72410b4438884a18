//! Machine-side interfaces the scheduler depends on.
//!
//! Machine semantics (event handlers, state transitions, send/receive queue
//! *behavior*) live outside this crate — it only defines the shapes the
//! scheduler consumes from a machine set and a runtime, plus one reference
//! in-memory implementation (`mock`) used by tests and the `cli` demo mode.

pub mod environment;
pub mod message;
pub mod mock;
pub mod value;

pub use environment::{LocalState, MachineEnvironment, MachineError};
pub use message::{Message, SendBuffer};
pub use mock::InMemoryEnvironment;
pub use value::{MachineId, Value};
