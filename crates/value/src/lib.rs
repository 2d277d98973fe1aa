//! Dynamic values with reference identity, and the draft producer that edits them.
//!
//! Containers (`Array`, `Object`) are shared allocations: cloning a `Value`
//! clones a handle, and two handles are the same value only if they point at
//! the same allocation. Edits go through [`Draft`], which copies on write and
//! shares everything it did not touch.
//!
//! # Invariants
//! - A draft that changed nothing finishes to the exact base allocation.
//! - Only containers on the path of an edit are reallocated.
//! - `Value::write_in_place` is the one way to edit shared data directly; the
//!   audit crate exists to catch it.

mod draft;
mod json;
mod value;

pub use draft::{Draft, DraftError, ValueProducer};
pub use value::Value;
