//! Shared types used across the rewind crates.
//!
//! # Invariants
//! - `Key` ordering is total: indices, then named fields, then `length`.
//! - A `Path` renders as its keys joined with `.` and parses back from that form.

mod types;

pub use types::{ContainerId, Key, Path};
