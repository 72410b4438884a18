//! Opaque value-summary / guard algebra façade.
//!
//! `Guard`, `PrimitiveVS`, and `Concretizer` are kept behind this crate so
//! the search engine contains no solver-specific code: the `scheduler`
//! crate only ever calls trait methods here, never inspects a DNF term
//! directly. The `Guard` implementation below (a DNF over signed atom ids)
//! is a reference backend, not the contract; a real SAT/BDD-backed `Guard`
//! could be swapped in without touching `scheduler`.

pub mod concretizer;
pub mod guard;
pub mod value_summary;

pub use concretizer::{Concretizer, DnfConcretizer};
pub use guard::{Guard, GuardFactory};
pub use value_summary::{GuardedValue, PrimitiveVS};
