//! Mutation Audit: detects in-place edits to values that were supposed to be immutable.
//!
//! # Invariants
//! - A node whose parent kept its identity must keep its own identity too;
//!   anything else is an in-place mutation.
//! - NaN never counts as a change against NaN.
//! - The shadow is only rebuilt after a clean check.

mod reflect;
mod timeline;
mod tracker;

pub use reflect::Reflect;
pub use timeline::Tracked;
pub use tracker::{Detection, MutationError, MutationTracker, UNRESOLVED_VALUE, value_at_path};
