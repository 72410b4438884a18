//! Ambient crate: logging setup shared by the `cli` binary and the other
//! workspace crates' examples/tests.

pub mod logger;

pub use logger::{child_span, init_logger, root_span, TraceId};
