//! Host Adapter: owns one history, commits commands, audits after each commit.
//!
//! # Invariants
//! - A container is driven by a single owner; it is `!Send` by construction.
//! - Every commit is followed by an audit when detection is enabled.
//! - A detected mutation is reported, never repaired.

mod config;
mod container;

pub use config::ContainerConfig;
pub use container::TimeTravel;
